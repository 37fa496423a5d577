pub mod admin;
pub mod health;
pub mod ingress;
pub mod lock;
pub mod route;
