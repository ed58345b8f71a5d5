use std::collections::BTreeSet;

use echochat::ChatConfig;
use tracing::error;

pub const DEFAULT_BOT: &str = "default";

pub struct Args {
    pub host: Option<String>,
    pub secure: Option<bool>,
    pub mock: Option<bool>,
    pub bot: String,
    pub datapath: Option<String>,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args {
            host: None,
            secure: None,
            mock: None,
            bot: DEFAULT_BOT.to_owned(),
            datapath: None,
        };

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--secure" {
                res.secure = Some(true);
            } else if arg == "--insecure" {
                res.secure = Some(false);
            } else if arg == "--mock" {
                res.mock = Some(true);
            } else if arg == "--live" {
                res.mock = Some(false);
            } else if arg == "--host" {
                i += 1;
                let Some(host) = args.get(i) else {
                    error!("host argument missing?");
                    continue;
                };
                res.host = Some(host.clone());
            } else if arg == "--bot" {
                i += 1;
                let Some(bot) = args.get(i) else {
                    error!("bot argument missing?");
                    continue;
                };
                res.bot = bot.clone();
            } else if arg == "--datapath" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("datapath argument missing?");
                    continue;
                };
                res.datapath = Some(path.clone());
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }

    /// Command line flags win over the environment.
    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(secure) = self.secure {
            config.secure = secure;
        }
        if let Some(mock) = self.mock {
            config.mock = mock;
        }
        if let Some(path) = &self.datapath {
            config.data_dir = path.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_flags() {
        let (args, unrecognized) = Args::parse(&args(&[
            "--host",
            "chat.example.com",
            "--secure",
            "--mock",
            "--bot",
            "support",
            "--wat",
        ]));

        assert_eq!(args.host.as_deref(), Some("chat.example.com"));
        assert_eq!(args.secure, Some(true));
        assert_eq!(args.mock, Some(true));
        assert_eq!(args.bot, "support");
        assert_eq!(
            unrecognized.into_iter().collect::<Vec<_>>(),
            vec!["--wat".to_string()]
        );
    }

    #[test]
    fn later_flags_win() {
        let (args, _) = Args::parse(&args(&["--mock", "--live", "--secure", "--insecure"]));
        assert_eq!(args.mock, Some(false));
        assert_eq!(args.secure, Some(false));
        assert_eq!(args.bot, DEFAULT_BOT);
    }

    #[test]
    fn overrides_config() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let datapath = tmp.path().to_string_lossy().to_string();
        let (args, _) = Args::parse(&args(&["--host", "h:1", "--datapath", &datapath]));

        let mut config = ChatConfig::default();
        args.apply(&mut config);

        assert_eq!(config.host, "h:1");
        assert_eq!(config.data_dir, PathBuf::from(&datapath));
        assert!(!config.secure);
    }
}
