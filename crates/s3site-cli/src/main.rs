use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3site_core::{Config, Deployer, S3Client};

#[derive(Parser)]
#[command(name = "s3site")]
#[command(author, version, about = "S3 静的サイトデプロイツール", long_about = None)]
struct Cli {
    /// デバッグログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// バケット作成 → アップロード → ウェブホスティング設定を順に実行
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        upload: UploadArgs,

        #[command(flatten)]
        web: WebArgs,
    },

    /// バケットを作成
    CreateBucket {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// ファイルまたはディレクトリをアップロード
    Upload {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        upload: UploadArgs,
    },

    /// CORS・公開ポリシー・ウェブサイト設定を適用
    WebConfig {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        web: WebArgs,
    },
}

#[derive(Args, Debug, Default)]
struct TargetArgs {
    /// 設定ファイル（デフォルト: ./s3site.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// バケット名（S3SITE_BUCKET・設定ファイルより優先）
    #[arg(short, long)]
    bucket: Option<String>,

    /// リージョン（未指定ならプロバイダのデフォルト）
    #[arg(short, long)]
    region: Option<String>,

    /// S3 互換サービスのエンドポイント
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[derive(Args, Debug, Default)]
struct UploadArgs {
    /// アップロード元（デフォルト: ../src/）
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// オブジェクトキー（ディレクトリの場合はプレフィックス）
    #[arg(short, long)]
    key: Option<String>,
}

#[derive(Args, Debug, Default)]
struct WebArgs {
    /// インデックスドキュメント（デフォルト: chat.html）
    #[arg(long)]
    index: Option<String>,

    /// エラードキュメント（デフォルト: error.html）
    #[arg(long)]
    error: Option<String>,

    /// CORS 設定をスキップ
    #[arg(long)]
    no_cors: bool,

    /// 公開ポリシーとウェブサイト設定をスキップ
    #[arg(long)]
    private: bool,
}

/// 設定ファイル・環境変数・引数をまとめた実行設定
struct Settings {
    config: Config,
    bucket: String,
}

fn main() -> Result<()> {
    // .env を環境変数に読み込む（ログ設定にも使うのでロギング初期化より先）
    let dotenv_warning = dotenv_problem(dotenvy::dotenv());

    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    if let Some(problem) = dotenv_warning {
        tracing::warn!("Failed to load .env: {}", problem);
    }

    match cli.command {
        Commands::Deploy {
            target,
            upload,
            web,
        } => deploy(&target, &upload, &web),
        Commands::CreateBucket { target } => {
            let settings = load_settings(&target, None, None)?;
            let deployer = connect(&settings.config)?;
            finish(&[create_bucket(&deployer, &settings)])
        }
        Commands::Upload { target, upload } => {
            let settings = load_settings(&target, Some(&upload), None)?;
            let deployer = connect(&settings.config)?;
            finish(&[upload_source(&deployer, &settings)])
        }
        Commands::WebConfig { target, web } => {
            let settings = load_settings(&target, None, Some(&web))?;
            let deployer = connect(&settings.config)?;
            finish(&[web_config(&deployer, &settings)])
        }
    }
}

fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// .env の読み込み結果から警告すべきエラーを取り出す（ファイルが無いだけなら None）
fn dotenv_problem(result: dotenvy::Result<PathBuf>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(e),
    }
}

/// 設定ファイルを読み込み、引数で上書き
fn load_settings(
    target: &TargetArgs,
    upload: Option<&UploadArgs>,
    web: Option<&WebArgs>,
) -> Result<Settings> {
    let mut config = Config::load(target.config.as_deref()).context("設定ファイルの読み込みに失敗しました")?;

    if target.region.is_some() {
        config.region = target.region.clone();
    }
    if target.endpoint_url.is_some() {
        config.storage.endpoint_url = target.endpoint_url.clone();
    }

    if let Some(upload) = upload {
        if let Some(source) = &upload.source {
            config.source = source.clone();
        }
        if upload.key.is_some() {
            config.key = upload.key.clone();
        }
    }

    if let Some(web) = web {
        if web.index.is_some() {
            config.index_document = web.index.clone();
        }
        if web.error.is_some() {
            config.error_document = web.error.clone();
        }
        config.cors &= !web.no_cors;
        config.public &= !web.private;
    }

    let bucket = match &target.bucket {
        Some(bucket) => bucket.clone(),
        None => config.resolve_bucket()?,
    };
    tracing::debug!("Resolved settings for bucket '{}': {:?}", bucket, config);

    Ok(Settings { config, bucket })
}

fn connect(config: &Config) -> Result<Deployer<S3Client>> {
    let client = S3Client::from_env(&config.storage).context("S3 クライアントの初期化に失敗しました")?;
    Ok(Deployer::new(client))
}

fn deploy(target: &TargetArgs, upload: &UploadArgs, web: &WebArgs) -> Result<()> {
    let settings = load_settings(target, Some(upload), Some(web))?;

    println!(
        "{} {}",
        "🚀 デプロイ開始:".cyan().bold(),
        format!("s3://{}", settings.bucket).bright_blue()
    );

    let deployer = connect(&settings.config)?;

    // 前のステップが失敗しても後続は実行する
    let results = [
        create_bucket(&deployer, &settings),
        upload_source(&deployer, &settings),
        web_config(&deployer, &settings),
    ];

    finish(&results)
}

fn create_bucket(deployer: &Deployer<S3Client>, settings: &Settings) -> bool {
    run_step("🪣 バケットを作成中...", || {
        deployer.create_bucket(&settings.bucket, settings.config.region.as_deref())
    })
}

fn upload_source(deployer: &Deployer<S3Client>, settings: &Settings) -> bool {
    let source = &settings.config.source;
    print_source_summary(source);

    run_step("📤 アップロード中...", || {
        deployer.upload(
            &settings.bucket,
            source,
            settings.config.region.as_deref(),
            settings.config.upload_key(),
        )
    })
}

fn web_config(deployer: &Deployer<S3Client>, settings: &Settings) -> bool {
    let config = &settings.config;

    run_step("🌐 ウェブホスティングを設定中...", || {
        deployer.set_bucket_web_config(
            &settings.bucket,
            config.region.as_deref(),
            config.index_document.as_deref(),
            config.error_document.as_deref(),
            config.cors,
            config.public,
        )
    })
}

fn print_source_summary(source: &Path) {
    if !source.is_dir() {
        return;
    }

    if let (Ok(count), Ok(size)) = (
        s3site_core::utils::count_files(source),
        s3site_core::utils::calculate_dir_size(source),
    ) {
        println!(
            "  {} {} 件のファイル (合計: {})",
            source.display().to_string().bright_blue(),
            count.to_string().yellow().bold(),
            s3site_core::utils::format_size(size).yellow()
        );
    }
}

/// スピナーを表示しながらステップを実行し、結果を表示
fn run_step(message: &'static str, step: impl FnOnce() -> bool) -> bool {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let ok = step();
    spinner.finish_and_clear();

    let label = message.trim_end_matches("...");
    if ok {
        println!("{} {}", "✅".green(), label);
    } else {
        println!("{} {} {}", "❌".red(), label, "失敗".red().bold());
    }

    ok
}

fn finish(results: &[bool]) -> Result<()> {
    let failed = results.iter().filter(|ok| !**ok).count();

    if failed > 0 {
        anyhow::bail!("{} 件のステップが失敗しました（詳細はログを確認してください）", failed);
    }

    println!("\n{}", "✨ 完了".green().bold());
    Ok(())
}
