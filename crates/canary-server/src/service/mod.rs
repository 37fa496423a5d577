pub mod kubernetes;

pub use kubernetes::KubeIngressClient;
