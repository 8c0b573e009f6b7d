//! Repository construction from configuration.

use crate::{BackendType, Config, Repository, Result};
#[cfg(feature = "onepassword")]
use crate::VaultorgError;
use std::sync::Arc;
use tracing::info;

/// Creates a repository from configuration.
///
/// The fake backend loads its snapshot here (an absent `storage_path` keeps
/// state in memory). The 1Password backend checks that `op_path` resolves to
/// an installed program.
///
/// # Errors
///
/// Returns an error if:
/// - The backend's feature flag is not enabled
/// - The `op` program is not installed
///
/// # Example
///
/// ```no_run
/// use vaultorg::{Config, factory};
///
/// #[tokio::main]
/// async fn main() -> vaultorg::Result<()> {
///     let repo = factory::new_repository(Config::from_env()?).await?;
///     println!("using {}", repo.name());
///     Ok(())
/// }
/// ```
pub async fn new_repository(config: Config) -> Result<Arc<dyn Repository>> {
    info!(backend = %config.backend, "creating repository");

    match config.backend {
        #[cfg(feature = "fake")]
        BackendType::Fake => {
            use crate::backends::fake::FakeRepository;

            let repo = match config.storage_path {
                Some(path) => FakeRepository::open(path).await,
                None => FakeRepository::in_memory(),
            };
            Ok(Arc::new(repo))
        }

        #[cfg(feature = "onepassword")]
        BackendType::OnePassword => {
            use crate::backends::onepassword::OnePasswordRepository;
            use crate::cli::check_command_exists;

            if !check_command_exists(&config.op_path).await? {
                return Err(VaultorgError::BackendNotInstalled(format!(
                    "{} (install the 1Password CLI or set op_path)",
                    config.op_path
                )));
            }
            Ok(Arc::new(OnePasswordRepository::new(&config)))
        }

        #[allow(unreachable_patterns)]
        other => Err(crate::VaultorgError::Other(anyhow::anyhow!(
            "backend {} is not compiled in (did you enable the '{}' feature flag?)",
            other,
            other
        ))),
    }
}
