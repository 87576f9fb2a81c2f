use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use spotify2ytmusic::{
    BulkExportOptions, BulkExportResult, BulkExporter, ComparisonResult, Config, ExportFormat,
    LibraryDumper, ProgressReporter, ProgressUpdate, Service, SpotifyClient, SyncEngine,
    TransferOptions, TransferRunResult, YtMusicClient,
};

#[derive(Parser)]
#[command(name = "spotify2ytmusic")]
#[command(about = "Migrate and archive playlists between Spotify and YouTube Music")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate one playlist from Spotify to YouTube Music
    Transfer {
        /// Playlist id, exact name, or open.spotify.com URL
        playlist: String,

        /// Compute matches without creating the destination playlist
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare one playlist across both services
    Diff {
        /// Spotify playlist id
        source_id: String,

        /// YouTube Music playlist id
        destination_id: String,
    },

    /// Export playlists to on-disk archives
    Export {
        /// Playlist ids to export (omit when using --all)
        playlist_ids: Vec<String>,

        /// Export every playlist on the account
        #[arg(long)]
        all: bool,

        /// Archive format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output directory (defaults to spotify_export_<timestamp>)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Concurrent render workers (clamped to 1-10)
        #[arg(long, default_value_t = 5)]
        workers: usize,

        /// Fetch rate limit in requests per second
        #[arg(long, default_value_t = 5.0)]
        rate_limit: f64,
    },

    /// Snapshot the library (playlists, albums, artists, tracks) as JSON
    Dump {
        /// Output directory
        #[arg(long, default_value = "library_dumps")]
        output: PathBuf,
    },

    /// List your Spotify playlists
    ListPlaylists,

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Transfer { playlist, dry_run } => {
            transfer(&playlist, dry_run).await?;
        }
        Commands::Diff {
            source_id,
            destination_id,
        } => {
            diff(&source_id, &destination_id).await?;
        }
        Commands::Export {
            playlist_ids,
            all,
            format,
            output,
            workers,
            rate_limit,
        } => {
            export(playlist_ids, all, format, output, workers, rate_limit).await?;
        }
        Commands::Dump { output } => {
            dump(&output).await?;
        }
        Commands::ListPlaylists => {
            list_playlists().await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

/// Cancel the returned token on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let child = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            child.cancel();
        }
    });
    cancel
}

/// Drive an indicatif bar from the engine's progress stream. Dropping the
/// reporter ends the task.
fn progress_channel() -> (ProgressReporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(256);

    let handle = tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        while let Some(update) = rx.recv().await {
            if update.total > 0 {
                pb.set_length(update.total as u64);
                pb.set_position(update.step.min(update.total) as u64);
            }
            pb.set_message(update.message);
        }

        pb.finish_and_clear();
    });

    (ProgressReporter::new(tx), handle)
}

async fn spotify_client(config: &Config) -> Result<Arc<SpotifyClient>> {
    let missing = config.missing_spotify_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Please copy .env.example to .env and fill in your credentials.".yellow()
        );
        std::process::exit(1);
    }

    let client = SpotifyClient::new();
    client
        .authenticate(&config.spotify_credentials())
        .await
        .context("Failed to authenticate with Spotify")?;
    Ok(Arc::new(client))
}

async fn ytmusic_client(config: &Config) -> Result<Arc<YtMusicClient>> {
    let missing = config.missing_ytmusic_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        std::process::exit(1);
    }

    let client = YtMusicClient::new();
    client
        .authenticate(&config.ytmusic_credentials())
        .await
        .context("Failed to authenticate with YouTube Music")?;
    Ok(Arc::new(client))
}

async fn transfer(playlist: &str, dry_run: bool) -> Result<()> {
    println!("{}", "Spotify to YouTube Music Migrator".cyan().bold());
    println!("{}", "=".repeat(50));

    if dry_run {
        println!("{}", "DRY RUN MODE - no playlist will be created".yellow());
    }

    let config = Config::from_env();
    let source = spotify_client(&config).await?;
    let destination = ytmusic_client(&config).await?;

    let playlist_ref = if playlist.starts_with("http") || playlist.starts_with("spotify:") {
        SpotifyClient::parse_playlist_url(playlist).context("Failed to parse Spotify URL")?
    } else {
        playlist.to_string()
    };

    let engine = SyncEngine::new(source, destination);
    let cancel = cancel_on_ctrl_c();
    let (reporter, ui) = progress_channel();

    let result = engine
        .transfer(
            &cancel,
            &playlist_ref,
            &TransferOptions { dry_run },
            &reporter,
        )
        .await?;

    drop(reporter);
    ui.await.ok();

    print_transfer_summary(&result, dry_run);
    Ok(())
}

fn print_transfer_summary(result: &TransferRunResult, dry_run: bool) {
    println!();
    println!("{}", "=".repeat(50));
    println!("{}", "TRANSFER SUMMARY".bold());
    println!("{}", "=".repeat(50));
    println!("Playlist: {}", result.source.playlist.name);
    println!(
        "Matched: {} / {}",
        result.success_count.to_string().green(),
        result.total
    );
    println!("Failed: {}", result.failed_count.to_string().red());

    let rate = format!("{:.1}%", result.match_percentage);
    let rate = if result.match_percentage >= 90.0 {
        rate.green()
    } else if result.match_percentage >= 70.0 {
        rate.yellow()
    } else {
        rate.red()
    };
    println!("Match rate: {}", rate);

    if let Some(destination) = &result.destination {
        println!(
            "Created: {} ({})",
            destination.name.green(),
            destination.id
        );
    } else if dry_run {
        println!("{}", "Dry run completed - no changes made".yellow());
    }

    let failed: Vec<_> = result.matches.iter().filter(|m| !m.is_success()).collect();
    if !failed.is_empty() {
        println!("\n{}", "Failed to match:".yellow());
        for m in &failed {
            println!("  - {} by {}", m.original.title, m.original.artist);
        }
    }

    if let Some(error) = &result.error {
        println!("\n{} {}", "Transfer incomplete:".red(), error);
    }
}

async fn diff(source_id: &str, destination_id: &str) -> Result<()> {
    println!("{}", "Cross-Service Playlist Diff".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();
    let source = spotify_client(&config).await?;
    let destination = ytmusic_client(&config).await?;

    let engine = SyncEngine::new(source, destination);
    let cancel = cancel_on_ctrl_c();
    let (reporter, ui) = progress_channel();

    let result = engine
        .diff(&cancel, source_id, destination_id, &reporter)
        .await?;

    drop(reporter);
    ui.await.ok();

    print_diff_summary(&result);
    Ok(())
}

fn print_diff_summary(result: &ComparisonResult) {
    println!();
    println!("{}", "=".repeat(50));
    println!("{}", "COMPARISON".bold());
    println!("{}", "=".repeat(50));
    println!(
        "{} vs {}",
        result.source.name.green(),
        result.destination.name.green()
    );
    println!("In sync: {}", result.matched_count.to_string().green());

    if !result.missing_in_dest.is_empty() {
        println!(
            "\n{}",
            format!("Missing on destination ({}):", result.missing_in_dest.len()).yellow()
        );
        for track in &result.missing_in_dest {
            println!("  - {} by {}", track.title, track.artist);
        }
    }

    if !result.extra_in_dest.is_empty() {
        println!(
            "\n{}",
            format!("Extra on destination ({}):", result.extra_in_dest.len()).yellow()
        );
        for track in &result.extra_in_dest {
            println!("  + {} by {}", track.title, track.artist);
        }
    }

    if result.missing_in_dest.is_empty() && result.extra_in_dest.is_empty() {
        println!("\n{}", "Playlists are in sync".green());
    }
}

async fn export(
    playlist_ids: Vec<String>,
    all: bool,
    format: ExportFormat,
    output: Option<PathBuf>,
    workers: usize,
    rate_limit: f64,
) -> Result<()> {
    println!("{}", "Bulk Playlist Export".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();
    let service = spotify_client(&config).await?;

    let ids = if all {
        service
            .get_playlists()
            .await
            .context("Failed to fetch playlists")?
            .into_iter()
            .map(|p| p.id)
            .collect()
    } else if playlist_ids.is_empty() {
        println!("{}", "No playlist ids given (or pass --all)".red());
        std::process::exit(1);
    } else {
        playlist_ids
    };

    let cancel = cancel_on_ctrl_c();
    let (reporter, ui) = progress_channel();

    let options = BulkExportOptions {
        format,
        output_dir: output,
        num_workers: workers,
        rate_limit,
        cover_art: None,
    };
    let result = BulkExporter::new(service)
        .run(&cancel, &ids, &options, &reporter)
        .await?;

    drop(reporter);
    ui.await.ok();

    print_export_summary(&result);
    Ok(())
}

fn print_export_summary(result: &BulkExportResult) {
    println!();
    println!("{}", "=".repeat(50));
    println!("{}", "EXPORT SUMMARY".bold());
    println!("{}", "=".repeat(50));
    println!("Output: {}", result.output_directory.display());
    println!(
        "Exported: {} / {}",
        result.successful_exports.to_string().green(),
        result.total_playlists
    );
    println!("Failed: {}", result.failed_exports.to_string().red());

    for item in &result.results {
        if item.success {
            println!(
                "  {} {} ({} files)",
                "ok".green(),
                item.playlist_name,
                item.files.len()
            );
        } else {
            let reason = item
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            println!("  {} {}: {}", "failed".red(), item.playlist_id, reason);
        }
    }

    if let Some(path) = &result.manifest_path {
        println!("\nManifest: {}", path.display());
    }

    if let Some(error) = &result.error {
        println!("\n{} {}", "Warning:".yellow(), error);
    }
}

async fn dump(output: &Path) -> Result<()> {
    println!("{}", "Library Dump".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();
    let client = spotify_client(&config).await?;

    let cancel = cancel_on_ctrl_c();
    let (reporter, ui) = progress_channel();

    let dumper = LibraryDumper::new(client.as_ref(), "Spotify");
    let path = dumper.run(&cancel, output, &reporter).await?;

    drop(reporter);
    ui.await.ok();

    println!("\n{} {}", "Library dump written to".green(), path.display());
    Ok(())
}

async fn list_playlists() -> Result<()> {
    println!("{}", "Your Spotify Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env();
    let client = spotify_client(&config).await?;

    let playlists = client
        .get_playlists()
        .await
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks)",
            i + 1,
            playlist.name.green(),
            playlist.track_count
        );
        if !playlist.description.is_empty() {
            println!("     {}", playlist.description.cyan());
        }
    }

    println!(
        "\n{}",
        format!("Total: {} playlists", playlists.len()).cyan()
    );

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Spotify to YouTube Music Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");

    println!("\n{}", "2. YouTube API Setup".yellow());
    println!("   - Go to https://console.cloud.google.com/");
    println!("   - Enable the YouTube Data API v3");
    println!("   - Obtain an OAuth access token with the youtube scope");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     YTMUSIC_ACCESS_TOKEN=your_youtube_access_token");

    println!("\n{}", "4. Usage".yellow());
    println!("   - spotify2ytmusic list-playlists            (see your playlists)");
    println!("   - spotify2ytmusic transfer \"Playlist Name\"  (migrate one playlist)");
    println!("   - spotify2ytmusic transfer <URL> --dry-run  (preview a migration)");
    println!("   - spotify2ytmusic diff <spotify-id> <yt-id> (compare a playlist)");
    println!("   - spotify2ytmusic export --all --format csv (archive everything)");
    println!("   - spotify2ytmusic dump                      (snapshot your library)");

    println!("\n{}", "Ready to start migrating!".green());
}
