use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use stash_console::admin::{spawn_live_view, TaskAction, TaskDashboard, TaskForm};
use stash_console::api::{AdminApi, ApiClient, GalleryApi};
use stash_console::browse::GallerySession;
use stash_console::config::{load_config, save_default_config, Config};
use stash_console::constants::{CONFIG_PATH, THUMBNAILS_DIR};
use stash_console::error::{ClientError, ClientResult};
use stash_console::logging::{init_logging, install_panic_hook};
use stash_console::models::{Category, LocalSort, TaskType, UpdateTaskRequest};
use stash_console::render::{
    render_dashboard, render_gallery_detail, render_gallery_page, render_queue, render_stats,
    render_task, ViewMode,
};
use stash_console::translation::{HttpTranslationSource, TagTranslationCache};
use stash_console::VERSION;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "stash")]
#[command(version)]
#[command(about = "Browse the gallery cache and manage its sync tasks", long_about = None)]
struct Cli {
    /// Service base URL, overriding the config file and STASH_API_URL
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration file
    InitConfig,
    /// List one page of galleries
    Galleries(GalleriesArgs),
    /// Show a single gallery
    Gallery(GalleryArgs),
    /// Show collection statistics
    Stats,
    /// Download a gallery thumbnail
    Thumb(ThumbArgs),
    /// Manage sync tasks
    #[command(subcommand)]
    Tasks(TaskCommands),
    /// Show thumbnail queue counters
    Queue,
    /// Live task dashboard, refreshed on an interval
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct GalleriesArgs {
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    #[arg(long = "page-size")]
    page_size: Option<u32>,

    /// Category name, e.g. "Doujinshi" or "Artist CG"
    #[arg(short, long)]
    category: Option<Category>,

    /// Tag as namespace:value
    #[arg(short, long)]
    tag: Option<String>,

    #[arg(long = "min-fav")]
    min_fav: Option<u64>,

    #[arg(long)]
    language: Option<String>,

    /// Hide galleries rated below this on the fetched page
    #[arg(long = "min-rating")]
    min_rating: Option<f64>,

    /// fav_count, rating, comment_count or posted_at (applied to the page)
    #[arg(short, long)]
    sort: Option<LocalSort>,

    /// Detailed list view instead of the compact grid
    #[arg(long)]
    list: bool,

    /// Show tag translations in list view
    #[arg(long)]
    translate: bool,

    /// Print the raw response as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GalleryArgs {
    gid: i64,

    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ThumbArgs {
    gid: i64,

    /// Target directory (defaults to the data directory's thumbnails folder)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    /// List sync tasks
    List,
    /// Show one task
    Show { id: i64 },
    /// Create a task
    Create(CreateTaskArgs),
    /// Rename a task or change config keys
    Patch(PatchTaskArgs),
    /// Request a task start
    Start { id: i64 },
    /// Request a task stop
    Stop { id: i64 },
    /// Delete a stopped task
    Delete(DeleteTaskArgs),
}

#[derive(Args, Debug)]
struct CreateTaskArgs {
    name: String,

    /// full or incremental
    #[arg(long = "type", default_value = "full")]
    task_type: TaskType,

    /// Category scanned by a full task
    #[arg(long)]
    category: Option<Category>,

    /// First gid of a full scan
    #[arg(long = "start-gid")]
    start_gid: Option<i64>,

    /// Categories of an incremental task, comma separated
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    #[arg(long = "scan-window")]
    scan_window: Option<u64>,

    #[arg(long = "rating-diff-threshold")]
    rating_diff_threshold: Option<f64>,
}

#[derive(Args, Debug)]
struct PatchTaskArgs {
    id: i64,

    #[arg(long)]
    name: Option<String>,

    /// Config override as key=value; the value is read as JSON when it parses
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Args, Debug)]
struct DeleteTaskArgs {
    id: i64,

    /// Task name, typed back to confirm; prompted for when omitted
    #[arg(long)]
    confirm: Option<String>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Poll interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Render once and exit
    #[arg(long)]
    once: bool,
}

fn parse_config_overrides(pairs: &[String]) -> ClientResult<Map<String, Value>> {
    let mut config = Map::new();
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            ClientError::Validation(format!("Expected KEY=VALUE, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ClientError::Validation(format!("Empty key in '{}'", pair)));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        config.insert(key.to_string(), value);
    }
    Ok(config)
}

fn build_form(args: &CreateTaskArgs) -> TaskForm {
    let mut form = TaskForm::new();
    form.set_name(&args.name);
    form.set_type(args.task_type);

    match args.task_type {
        TaskType::Full => {
            if let Some(category) = args.category {
                form.set_category(category);
            }
            form.set_start_gid(args.start_gid);
        }
        TaskType::Incremental => {
            if !args.categories.is_empty() {
                let selected = form.config().categories().to_vec();
                for category in Category::ALL {
                    if selected.contains(&category) != args.categories.contains(&category) {
                        form.toggle_category(category);
                    }
                }
            }
            if let Some(window) = args.scan_window {
                form.set_scan_window(window);
            }
            if let Some(threshold) = args.rating_diff_threshold {
                form.set_rating_diff_threshold(threshold);
            }
        }
    }
    form
}

async fn prompt_line(prompt: &str) -> ClientResult<String> {
    eprint!("{}", prompt);
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn load_translations(config: &Config) -> Option<TagTranslationCache> {
    if !config.translation.enabled {
        return None;
    }
    let source = match HttpTranslationSource::new(&config.translation) {
        Ok(source) => source,
        Err(e) => {
            warn!("Tag translations disabled: {}", e);
            return None;
        }
    };
    let cache = TagTranslationCache::new(Arc::new(source));
    if let Err(e) = cache.load().await {
        warn!("{}", e);
    }
    Some(cache)
}

async fn list_galleries(config: &Config, api: &ApiClient, args: GalleriesArgs) -> ClientResult<()> {
    let mut browse = config.browse.clone();
    if let Some(page_size) = args.page_size {
        browse.page_size = page_size;
    }
    if let Some(sort) = args.sort {
        browse.sort = sort;
    }

    let mut session = GallerySession::from_config(&browse);
    let filters = session.filters_mut();
    filters.set_category(args.category);
    if let Some(tag) = &args.tag {
        filters.select_suggestion(tag);
    }
    filters.set_min_fav(args.min_fav);
    filters.set_language(args.language.as_deref());
    if let Some(min_rating) = args.min_rating {
        filters.set_min_rating(min_rating);
    }
    filters.set_page(args.page);

    let ticket = session.prepare_reload();
    let list = api.list_galleries(ticket.query()).await?;
    session.complete(ticket, Ok(list));

    if args.json {
        if let Some(list) = session.data() {
            println!("{}", serde_json::to_string_pretty(list)?);
        }
        return Ok(());
    }

    let mode = if args.list { ViewMode::List } else { browse.view_mode };
    let translations = if mode == ViewMode::List && (args.translate || browse.show_translation) {
        load_translations(config).await
    } else {
        None
    };

    if let Some(view) = session.view() {
        println!("{}", render_gallery_page(&view, mode, translations.as_ref()));
    }
    Ok(())
}

async fn run_tasks(config: &Config, api: ApiClient, command: TaskCommands) -> ClientResult<()> {
    let dashboard = TaskDashboard::new(Arc::new(api.clone()), config.dashboard.auto_refresh);

    match command {
        TaskCommands::List => {
            let loaded = dashboard.refresh().await;
            print!("{}", render_dashboard(&dashboard.snapshot()));
            if !loaded {
                std::process::exit(1);
            }
        }
        TaskCommands::Show { id } => {
            let task = api.get_task(id).await?;
            println!("{}", render_task(&task));
        }
        TaskCommands::Create(args) => {
            dashboard.refresh().await;
            dashboard.open_create();
            let form = build_form(&args);
            dashboard.update_form(|current| *current = form);
            let task = dashboard.submit_create().await?;
            println!("{}", render_task(&task));
        }
        TaskCommands::Patch(args) => {
            let overrides = parse_config_overrides(&args.set)?;
            let patch = UpdateTaskRequest {
                name: args.name,
                config: (!overrides.is_empty()).then_some(overrides),
            };
            if patch.is_empty() {
                return Err(ClientError::Validation("Nothing to update".to_string()));
            }
            let task = api.patch_task(args.id, &patch).await?;
            println!("{}", render_task(&task));
        }
        TaskCommands::Start { id } => {
            dashboard.refresh().await;
            dashboard.run_action(id, TaskAction::Start).await?;
            print!("{}", render_dashboard(&dashboard.snapshot()));
        }
        TaskCommands::Stop { id } => {
            dashboard.refresh().await;
            dashboard.run_action(id, TaskAction::Stop).await?;
            print!("{}", render_dashboard(&dashboard.snapshot()));
        }
        TaskCommands::Delete(args) => {
            dashboard.refresh().await;
            if !dashboard.open_delete(args.id) {
                return Err(ClientError::NotFound(format!("Task {} not found", args.id)));
            }
            let typed = match args.confirm {
                Some(typed) => typed,
                None => prompt_line("Type the task name to confirm deletion: ").await?,
            };
            dashboard.set_delete_confirmation(&typed);
            dashboard.confirm_delete().await?;
            println!("Deleted task {}", args.id);
        }
    }
    Ok(())
}

async fn watch(config: &Config, api: ApiClient, args: WatchArgs) -> ClientResult<()> {
    let dashboard = TaskDashboard::new(Arc::new(api), config.dashboard.auto_refresh);

    if args.once {
        dashboard.refresh().await;
        print!("{}", render_dashboard(&dashboard.snapshot()));
        return Ok(());
    }

    let interval = args
        .interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.dashboard.poll_interval());
    let cancel = CancellationToken::new();
    let poller = spawn_live_view(dashboard, interval, cancel.clone(), |snapshot| {
        print!("\x1b[2J\x1b[H{}", render_dashboard(&snapshot));
    });

    tokio::signal::ctrl_c().await?;
    cancel.cancel();
    if let Err(e) = poller.await {
        warn!("Dashboard poller ended abnormally: {}", e);
    }
    Ok(())
}

async fn run(cli: Cli) -> ClientResult<()> {
    if let Commands::InitConfig = cli.command {
        save_default_config(&CONFIG_PATH)?;
        println!("Default configuration saved to {:?}", *CONFIG_PATH);
        return Ok(());
    }

    let mut config = load_config(&CONFIG_PATH).with_env_overrides();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    debug!("stash-console {} using {}", VERSION, config.api.base_url);

    let api = ApiClient::new(&config.api)?;

    match cli.command {
        Commands::InitConfig => Ok(()),
        Commands::Galleries(args) => list_galleries(&config, &api, args).await,
        Commands::Gallery(args) => {
            let gallery = api.get_gallery(args.gid).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&gallery)?);
            } else {
                let thumb = api.thumbnail_url(gallery.gid);
                print!("{}", render_gallery_detail(&gallery, Some(thumb.as_str())));
            }
            Ok(())
        }
        Commands::Stats => {
            let stats = api.stats().await?;
            print!("{}", render_stats(&stats));
            Ok(())
        }
        Commands::Thumb(args) => {
            let thumbnail = api.thumbnail(args.gid).await?;
            let dir = args.output.unwrap_or_else(|| THUMBNAILS_DIR.clone());
            let path = thumbnail.save_to(&dir).await?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::Tasks(command) => run_tasks(&config, api, command).await,
        Commands::Queue => {
            let queue = api.thumb_queue_stats().await?;
            println!("{}", render_queue(&queue));
            Ok(())
        }
        Commands::Watch(args) => watch(&config, api, args).await,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    install_panic_hook();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}
