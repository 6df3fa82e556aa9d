use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::Path;
use tildepost::build::publish_posts;
use tildepost::config::Config;
use tildepost::duplicate::duplicate_all;
use tildepost::{logger, translate};
use tracing::{error, info};

fn main() {
    logger::init();

    let matches = App::new("tildepost")
        .about("Publishes text posts to a tilde.club blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("site")
                .short("s")
                .long("site")
                .value_name("DIR")
                .default_value(".")
                .help("The site directory (or any directory below a `tildepost.yaml`)"),
        )
        .subcommand(
            SubCommand::with_name("publish")
                .about("Converts waiting posts to HTML, adds them to the index and archives them")
                .arg(
                    Arg::with_name("date")
                        .long("date")
                        .value_name("YYYY-MM-DD")
                        .help("The date used for posts without one (defaults to today)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("duplicate")
                .about("Duplicates the marked block of each file in the inbox and translates the copy"),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let site = Path::new(matches.value_of("site").unwrap_or("."));
    let config = Config::from_directory(site)?;

    match matches.subcommand() {
        ("publish", Some(sub)) => {
            let today = match sub.value_of("date") {
                Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| anyhow!("Invalid --date `{}`: {}", date, e))?,
                None => Local::now().date_naive(),
            };
            let summary = publish_posts(&config, today)?;
            info!(
                "published {} posts ({} not indexed)",
                summary.published.len(),
                summary.unindexed.len()
            );
            Ok(())
        }
        ("duplicate", Some(_)) => {
            let translator = translate::from_config(&config.translation);
            let summary = duplicate_all(&config, translator.as_ref())?;
            match summary.failed.len() {
                0 => Ok(()),
                n => Err(anyhow!(
                    "{} of {} files could not be duplicated",
                    n,
                    n + summary.written.len()
                )),
            }
        }
        (name, _) => Err(anyhow!("unknown command `{}`", name)),
    }
}
