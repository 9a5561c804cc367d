mod error;
mod init;
mod layer;
mod mlp;
mod module;
mod neuron;

pub use error::Error;
pub use init::{Init, Uniform};
pub use layer::Layer;
pub use mlp::{Mlp, MlpConfig};
pub use module::Module;
pub use neuron::Neuron;
