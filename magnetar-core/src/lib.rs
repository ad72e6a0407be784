pub mod crawl;
pub mod report;

pub use magnetar_scanner::DiscoveredLink;

const BANNER: &str = r#"
                                    _
  _ __ ___   __ _  __ _ _ __   ___| |_ __ _ _ __
 | '_ ` _ \ / _` |/ _` | '_ \ / _ \ __/ _` | '__|
 | | | | | | (_| | (_| | | | |  __/ || (_| | |
 |_| |_| |_|\__,_|\__, |_| |_|\___|\__\__,_|_|
                  |___/
"#;

pub fn print_banner() {
    println!("{}", BANNER);
    println!(
        "  Magnetar v{} - harvests and ranks magnet links\n",
        env!("CARGO_PKG_VERSION")
    );
}
