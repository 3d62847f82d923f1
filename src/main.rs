use std::fs::File;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use log::{LevelFilter, error, info, warn};
use simplelog::{ConfigBuilder, WriteLogger};
use tokio::io::{AsyncBufReadExt, BufReader};

use reposcope::api::{
    Country, CountryDetails, GithubRepo, RealCountriesRepository, RealGithubRepository,
};
use reposcope::core::config::{self, CliOverrides, ResolvedConfig};
use reposcope::core::interactor::hide_listed_forks;
use reposcope::core::search::{Debouncer, SearchInput};
use reposcope::{
    AppState, CountriesInteractor, Loadable, ReposInteractor, Store, Subscription, paths,
};

#[derive(Parser)]
#[command(name = "reposcope", about = "Browse GitHub repositories and countries")]
struct Args {
    /// GitHub API base URL
    #[arg(long)]
    github_url: Option<String>,

    /// Countries API base URL
    #[arg(long)]
    countries_url: Option<String>,

    /// Results per request
    #[arg(long)]
    per_page: Option<u32>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search repositories
    Search { query: String },
    /// List forks of a repository picked from search results
    Forks {
        query: String,
        /// Index into the search results
        #[arg(long, default_value_t = 0)]
        pick: usize,
        /// Leave out forks that already appear in the search results
        #[arg(long)]
        hide_listed: bool,
    },
    /// Read queries from stdin, one per line, searching as they settle
    Watch,
    /// List all countries
    Countries,
    /// Show details of one country
    Country { name: String },
}

struct Interactors {
    repos: Arc<ReposInteractor>,
    countries: CountriesInteractor,
}

/// Wires the store and interactors from a resolved config.
fn build(config: &ResolvedConfig, store: &Store<AppState>, hide_listed: bool) -> std::io::Result<Interactors> {
    let github = RealGithubRepository::new(
        &config.github_base_url,
        config.github_token.as_deref(),
        config.per_page,
    )
    .map_err(std::io::Error::other)?;
    let countries = RealCountriesRepository::new(&config.countries_base_url)
        .map_err(std::io::Error::other)?;

    let mut repos = ReposInteractor::new(Arc::new(github), store.clone());
    if hide_listed {
        repos = repos.with_forks_merge(hide_listed_forks);
    }
    Ok(Interactors {
        repos: Arc::new(repos),
        countries: CountriesInteractor::new(Arc::new(countries), store.clone()),
    })
}

/// Follows `updates` until the load settles. Ctrl-C cancels the load.
async fn follow<T>(
    updates: &mut Subscription<Loadable<T>>,
    cancel: impl Fn(),
) -> Loadable<T> {
    loop {
        tokio::select! {
            next = updates.next() => match next {
                Some(Loadable::Loading { last, .. }) => {
                    if last.is_some() {
                        eprintln!("Refreshing...");
                    } else {
                        eprintln!("Loading...");
                    }
                }
                Some(state) if state.is_settled() => return state,
                Some(_) => {}
                None => return Loadable::NotRequested,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, cancelling load");
                cancel();
            }
        }
    }
}

/// Prints a failed load with a retry hint. Returns the value if loaded.
fn settled<T>(state: Loadable<T>, what: &str) -> Option<T> {
    match state {
        Loadable::Loaded(value) => Some(value),
        Loadable::Failed(e) => {
            error!("Loading {} failed: {}", what, e);
            eprintln!("Could not load {what}: {e}. Run the command again to retry.");
            None
        }
        _ => None,
    }
}

fn print_repos(repos: &[GithubRepo]) {
    if repos.is_empty() {
        println!("(no repositories)");
    }
    for (i, repo) in repos.iter().enumerate() {
        println!(
            "{:>3}  {:<40} ★ {:<7} forks {:<6} {}",
            i,
            repo.full_name(),
            repo.watchers,
            repo.forks,
            repo.description.as_deref().unwrap_or("")
        );
    }
}

fn print_countries(countries: &[Country]) {
    for country in countries {
        println!(
            "{}  {:<40} population {}",
            country.alpha3_code, country.name, country.population
        );
    }
}

fn print_details(country: &Country, details: &CountryDetails) {
    println!("{} ({})", country.name, country.alpha3_code);
    println!("  capital:    {}", details.capital);
    println!("  population: {}", country.population);
    for currency in &details.currencies {
        println!(
            "  currency:   {} {} {}",
            currency.code,
            currency.symbol.as_deref().unwrap_or(""),
            currency.name
        );
    }
    for neighbor in &details.neighbors {
        println!("  neighbor:   {}", neighbor.name);
    }
}

async fn search(store: &Store<AppState>, repos: &ReposInteractor, query: &str) -> Option<Vec<GithubRepo>> {
    let mut input = SearchInput::new();
    let Some(query) = input.submit(query) else {
        eprintln!("Nothing to search for.");
        return None;
    };
    let mut updates = store.subscribe(&paths::github_repos());
    let _task = repos.search_repos(&query);
    settled(follow(&mut updates, || repos.cancel_search()).await, "repositories")
}

async fn watch(store: &Store<AppState>, config: &ResolvedConfig, repos: Arc<ReposInteractor>) -> std::io::Result<()> {
    let mut updates = store.subscribe(&paths::github_repos());
    let printer = tokio::spawn(async move {
        while let Some(state) = updates.next().await {
            match state {
                Loadable::Loading { .. } => eprintln!("Loading..."),
                Loadable::Loaded(found) => print_repos(&found),
                Loadable::Failed(e) => eprintln!("Search failed: {e}"),
                Loadable::NotRequested => {}
            }
        }
    });

    let mut input = SearchInput::new();
    let mut debouncer = Debouncer::new(config.debounce);
    let mut last_scheduled = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(query) = input.submit(&line) {
            let repos = Arc::clone(&repos);
            last_scheduled = Some(debouncer.schedule(move || {
                let _ = repos.search_repos(&query);
            }));
        }
    }

    if let Some(pending) = last_scheduled
        && pending.await.unwrap_or(false)
    {
        // Let the final search settle before exiting.
        let mut final_state = store.subscribe(&paths::github_repos());
        follow(&mut final_state, || repos.cancel_search()).await;
    }
    printer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let overrides = CliOverrides {
        github_base_url: args.github_url.clone(),
        countries_base_url: args.countries_url.clone(),
        per_page: args.per_page,
        verbose: args.verbose,
    };

    // Initialize file logger - writes to reposcope.log in current directory.
    // The logger itself passes everything; the max level gates it, first from
    // env/CLI and then from the resolved config once the file has been read.
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("reposcope.log") {
        let _ = WriteLogger::init(LevelFilter::Trace, log_config, log_file);
    }
    log::set_max_level(config::startup_log_level(&overrides));

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("{}, using defaults", e);
        eprintln!("{e}, using defaults");
        Default::default()
    });
    let resolved = config::resolve(&file_config, &overrides);
    log::set_max_level(resolved.log_level);

    info!("reposcope starting up, github={}", resolved.github_base_url);

    let store = Store::new(AppState::default());
    let hide_listed = matches!(args.command, Command::Forks { hide_listed: true, .. });
    let interactors = build(&resolved, &store, hide_listed)?;

    match args.command {
        Command::Search { query } => {
            if let Some(found) = search(&store, &interactors.repos, &query).await {
                print_repos(&found);
            }
        }
        Command::Forks { query, pick, .. } => {
            let Some(found) = search(&store, &interactors.repos, &query).await else {
                return Ok(());
            };
            let Some(repo) = found.get(pick) else {
                eprintln!("No result #{pick}; the search returned {} repositories.", found.len());
                return Ok(());
            };
            store.set(&paths::selected_repo(), Some(repo.id));
            println!("Forks of {}:", repo.full_name());

            let mut updates = store.subscribe(&paths::forks(repo.id));
            let _task = interactors.repos.load_forks(repo);
            let state = follow(&mut updates, || interactors.repos.cancel_forks(repo.id)).await;
            if let Some(forks) = settled(state, "forks") {
                print_repos(&forks);
            }
        }
        Command::Watch => {
            watch(&store, &resolved, Arc::clone(&interactors.repos)).await?;
        }
        Command::Countries => {
            let mut updates = store.subscribe(&paths::countries());
            let _task = interactors.countries.load_countries();
            let state = follow(&mut updates, || interactors.countries.cancel_countries()).await;
            if let Some(countries) = settled(state, "countries") {
                print_countries(&countries);
            }
        }
        Command::Country { name } => {
            // Neighbours are resolved against the full list, so load it first.
            let mut list_updates = store.subscribe(&paths::countries());
            let _task = interactors.countries.load_countries();
            let state = follow(&mut list_updates, || interactors.countries.cancel_countries()).await;
            let Some(countries) = settled(state, "countries") else {
                return Ok(());
            };
            let Some(country) = countries
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&name) || c.alpha3_code.eq_ignore_ascii_case(&name))
            else {
                eprintln!("No country named '{name}'.");
                return Ok(());
            };

            let code = country.alpha3_code.clone();
            let mut updates = store.subscribe(&paths::country_details(&code));
            let _task = interactors.countries.load_country_details(country);
            let state = follow(&mut updates, || interactors.countries.cancel_country_details(&code)).await;
            if let Some(details) = settled(state, "country details") {
                print_details(country, &details);
            }
        }
    }

    info!("reposcope exiting");
    Ok(())
}
