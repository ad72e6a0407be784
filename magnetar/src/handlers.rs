use clap::ArgMatches;
use colored::Colorize;
use magnetar_core::DiscoveredLink;
use magnetar_core::crawl::{CrawlOptions, execute_crawl, scope_from_seeds, summarize};
use magnetar_core::report::{ReportFormat, write_reports};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, adding http:// to bare hosts
pub fn parse_url_line(line: &str) -> Option<String> {
    // "host:port" parses as a scheme-only URL, so insist on a host
    if Url::parse(line).is_ok_and(|url| url.has_host()) {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Build crawl options from the `crawl` subcommand's arguments.
pub fn crawl_options_from_matches(sub_matches: &ArgMatches, seeds: Vec<String>) -> CrawlOptions {
    let defaults = CrawlOptions::default();

    let mut domain_scope: Vec<String> = sub_matches
        .get_many::<String>("domain")
        .map(|domains| domains.cloned().collect())
        .unwrap_or_default();
    if sub_matches.get_flag("scope-to-seeds") {
        for host in scope_from_seeds(&seeds) {
            if !domain_scope.contains(&host) {
                domain_scope.push(host);
            }
        }
    }

    CrawlOptions {
        domain_scope,
        max_distance: sub_matches
            .get_one::<usize>("max-distance")
            .copied()
            .unwrap_or(defaults.max_distance),
        stages: sub_matches
            .get_one::<usize>("stages")
            .copied()
            .unwrap_or(defaults.stages),
        channel_capacity: sub_matches
            .get_one::<usize>("channel-capacity")
            .copied()
            .unwrap_or(defaults.channel_capacity),
        timeout_secs: sub_matches
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout_secs),
        verify_tls: sub_matches.get_flag("verify-tls"),
        target_scheme: sub_matches
            .get_one::<String>("scheme")
            .cloned()
            .unwrap_or(defaults.target_scheme),
        display_param: sub_matches
            .get_one::<String>("display-param")
            .cloned()
            .unwrap_or(defaults.display_param),
        show_progress_bars: true,
        seeds,
    }
}

fn print_ranked_links(links: &[DiscoveredLink]) {
    let summary = summarize(links);
    println!(
        "{} {} distinct links, {} references\n",
        "→".blue(),
        summary.distinct_links.to_string().cyan(),
        summary.total_references.to_string().cyan()
    );

    for (rank, link) in links.iter().enumerate() {
        let title = if link.title.is_empty() {
            "(untitled)"
        } else {
            link.title.as_str()
        };
        println!(
            "{:>4}. [{}] {}  {}",
            rank + 1,
            link.reference_count.to_string().cyan(),
            title.bright_white(),
            link.origin_host().dimmed()
        );
        println!("      {}", link.link);
    }
}

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");

    let seeds = match load_urls_from_source(url, hosts_file) {
        Ok(seeds) => seeds,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let options = crawl_options_from_matches(sub_matches, seeds);

    println!("\n🧲 Harvesting from {} seed(s)", options.seeds.len());
    println!("Stages: {}", options.stages);
    println!("Max distance: {}", options.max_distance);
    if options.domain_scope.is_empty() {
        println!("Scope: unrestricted\n");
    } else {
        println!("Scope: {}\n", options.domain_scope.join(", "));
    }

    let progress_callback = Arc::new(|msg: String| {
        println!("{}", msg);
    });

    let links = match execute_crawl(options, Some(progress_callback)).await {
        Ok(links) => links,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!("\n{} Crawl complete!\n", "✓".green().bold());

    let Some(output) = sub_matches.get_one::<String>("output") else {
        print_ranked_links(&links);
        return;
    };

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::All);
    let output_dir = PathBuf::from(shellexpand::tilde(output).as_ref());

    info!("Writing {:?} report(s) to {}", format, output_dir.display());
    match write_reports(&links, &output_dir, &format) {
        Ok(paths) => {
            let summary = summarize(&links);
            for path in paths {
                println!(
                    "{} Report saved: {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
            println!(
                "{} {} distinct links, {} references",
                "→".blue(),
                summary.distinct_links.to_string().cyan(),
                summary.total_references.to_string().cyan()
            );
        }
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
