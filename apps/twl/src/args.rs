//! Command line handling for the twl launcher.
//!
//! twl forwards its arguments to tailwindcss unchanged, so it cannot own a
//! conventional flag syntax. The single exception is `-version <token>`,
//! which selects the tailwindcss release and is removed before forwarding:
//!
//! ```bash
//! twl -i input.css -o output.css              # latest release
//! twl -version v3.4.17 -i input.css --minify  # pinned release
//! ```

use crate::errors::TwlError;
use crate::resolver::RequestedVersion;

/// Flag selecting the tailwindcss release.
pub const VERSION_FLAG: &str = "-version";

/// Parsed launcher arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    /// Release to run.
    pub version: RequestedVersion,
    /// Arguments forwarded to tailwindcss, in their original order.
    pub passthrough: Vec<String>,
}

impl LaunchArgs {
    /// Splits `args` (without the program name) into the requested version and
    /// the forwarded arguments. When `-version` is repeated, the last one wins.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::MissingVersionArg`] when `-version` is the last
    /// argument.
    pub fn parse<I>(args: I) -> Result<Self, TwlError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut version = RequestedVersion::Latest;
        let mut passthrough = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == VERSION_FLAG {
                let token = args.next().ok_or(TwlError::MissingVersionArg)?;
                version = RequestedVersion::parse(&token);
            } else {
                passthrough.push(arg);
            }
        }

        Ok(Self {
            version,
            passthrough,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<LaunchArgs, TwlError> {
        LaunchArgs::parse(args.iter().map(ToString::to_string))
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_means_latest() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.version, RequestedVersion::Latest);
        assert!(args.passthrough.is_empty());
    }

    #[test]
    fn arguments_without_version_flag_pass_through() {
        let args = parse(&["-i", "input.css", "-o", "output.css"]).unwrap();
        assert_eq!(args.version, RequestedVersion::Latest);
        assert_eq!(args.passthrough, strings(&["-i", "input.css", "-o", "output.css"]));
    }

    #[test]
    fn version_flag_is_removed() {
        let args = parse(&["-version", "v4.0.0", "-i", "input.css"]).unwrap();
        assert_eq!(args.version, RequestedVersion::Tag("v4.0.0".to_string()));
        assert_eq!(args.passthrough, strings(&["-i", "input.css"]));
    }

    #[test]
    fn version_flag_at_end() {
        let args = parse(&["-i", "input.css", "-version", "v3.0.0"]).unwrap();
        assert_eq!(args.version, RequestedVersion::Tag("v3.0.0".to_string()));
        assert_eq!(args.passthrough, strings(&["-i", "input.css"]));
    }

    #[test]
    fn explicit_latest_is_sentinel() {
        let args = parse(&["-version", "latest"]).unwrap();
        assert_eq!(args.version, RequestedVersion::Latest);
    }

    #[test]
    fn double_dash_version_is_forwarded() {
        let args = parse(&["--version"]).unwrap();
        assert_eq!(args.version, RequestedVersion::Latest);
        assert_eq!(args.passthrough, strings(&["--version"]));
    }

    #[test]
    fn missing_version_value_is_error() {
        assert!(matches!(
            parse(&["-version"]),
            Err(TwlError::MissingVersionArg)
        ));
        assert!(matches!(
            parse(&["-i", "input.css", "-version"]),
            Err(TwlError::MissingVersionArg)
        ));
    }
}
