use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("magnetar")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("magnetar")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl outward from one or more seed pages and rank the magnet links \
                found along the way.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-d --"domain" <DOMAIN>)
                        .required(false)
                        .help("Only fetch pages whose host:port is contained in DOMAIN (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"scope-to-seeds")
                        .required(false)
                        .help("Restrict the crawl to the hosts of the seed URLs")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"max-distance" <HOPS>)
                        .required(false)
                        .help("Pages a lineage may travel without finding a magnet link")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(-s --"stages" <NUM_STAGES>)
                        .required(false)
                        .help("Number of stages in the relay chain")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("16"),
                )
                .arg(
                    arg!(--"channel-capacity" <SIZE>)
                        .required(false)
                        .help("Queue capacity between stages; targets are dropped when full")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1048576"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"verify-tls")
                        .required(false)
                        .help("Verify TLS certificates (default: accept any certificate)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"scheme" <SCHEME>)
                        .required(false)
                        .help("Scheme of the links to harvest")
                        .default_value("magnet"),
                )
                .arg(
                    arg!(--"display-param" <NAME>)
                        .required(false)
                        .help("Query parameter holding a link's display name")
                        .default_value("dn"),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Write reports into DIR (default: print to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format written to --output: html, json, text, all")
                        .value_parser(["html", "json", "text", "all"])
                        .default_value("all"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_crawl_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["magnetar", "crawl", "-u", "http://example.com"])
            .unwrap();
        let (_, crawl) = matches.subcommand().unwrap();
        assert_eq!(crawl.get_one::<usize>("max-distance"), Some(&3));
        assert_eq!(crawl.get_one::<usize>("stages"), Some(&16));
        assert_eq!(crawl.get_one::<usize>("channel-capacity"), Some(&1048576));
        assert_eq!(crawl.get_one::<u64>("timeout"), Some(&5));
        assert_eq!(
            crawl.get_one::<String>("scheme").map(String::as_str),
            Some("magnet")
        );
        assert!(!crawl.get_flag("verify-tls"));
        assert!(crawl.get_many::<String>("domain").is_none());
    }

    #[test]
    fn test_repeated_domains() {
        let matches = command_argument_builder()
            .try_get_matches_from([
                "magnetar", "crawl", "-u", "http://a.example", "-d", "a.example", "-d",
                "b.example",
            ])
            .unwrap();
        let (_, crawl) = matches.subcommand().unwrap();
        let domains: Vec<&String> = crawl.get_many::<String>("domain").unwrap().collect();
        assert_eq!(domains, vec!["a.example", "b.example"]);
    }

    #[test]
    fn test_url_conflicts_with_hosts_file() {
        let result = command_argument_builder().try_get_matches_from([
            "magnetar",
            "crawl",
            "-u",
            "http://example.com",
            "-H",
            "hosts.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = command_argument_builder().try_get_matches_from([
            "magnetar",
            "crawl",
            "-u",
            "http://example.com",
            "-f",
            "pdf",
        ]);
        assert!(result.is_err());
    }
}
