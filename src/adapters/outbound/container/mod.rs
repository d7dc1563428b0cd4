/// Container engine adapters
mod docker_cli;

pub use docker_cli::{create_args, DockerCli};
