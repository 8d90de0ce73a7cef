use anyhow::Result;

pub mod init;
pub mod run;
pub mod validate;

pub use init::InitCommand;
pub use run::RunCommand;
pub use validate::ValidateCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
