//! Process exit codes.

use devmem_common::ConfigError;
use devmem_engine::{EngineError, ErrorKind};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_DEVICE: i32 = 3;
pub const EXIT_TIMING: i32 = 4;

/// Exit code for a failed run.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(engine) = err.downcast_ref::<EngineError>() {
        return match engine.kind() {
            ErrorKind::Configuration => EXIT_CONFIG,
            ErrorKind::Device => EXIT_DEVICE,
            ErrorKind::Timing => EXIT_TIMING,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    EXIT_GENERIC_FAIL
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use devmem_engine::{DeviceError, OptionError};

    #[test]
    fn engine_kinds_map_to_codes() {
        let config = anyhow::Error::new(EngineError::from(OptionError::Unknown("passes".into())));
        assert_eq!(exit_code_for(&config), EXIT_CONFIG);

        let device =
            anyhow::Error::new(EngineError::Release { source: DeviceError::UnknownBuffer { handle: 0 } });
        assert_eq!(exit_code_for(&device), EXIT_DEVICE);
    }

    #[test]
    fn context_does_not_hide_the_kind() {
        let err: anyhow::Result<()> =
            Err(ConfigError::Validation("thread_count must be > 0".into())).context("resolving constants");
        assert_eq!(exit_code_for(&err.unwrap_err()), EXIT_CONFIG);
    }

    #[test]
    fn anything_else_is_generic() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("disk full")), EXIT_GENERIC_FAIL);
    }
}
