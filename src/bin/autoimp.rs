// パス: src/bin/autoimp.rs
// 役割: 走査結果・別名表の表示と REPL 起動を行う CLI エントリポイント
// 意図: ライブラリの活性化処理を実ファイルの検索パスに対して手軽に試せるようにする
// 関連ファイル: src/lib.rs, src/config.rs, src/repl/cmd.rs
//! autoimp: 検索パス上の全モジュールを素の名前で使える REPL
//!
//! ```bash
//! # 検索パスに見つかるトップレベル名を列挙
//! autoimp --path ./site-packages scan
//!
//! # 別名表を JSON で出力
//! autoimp aliases --json
//!
//! # REPL（既定）
//! autoimp --path ./lib
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use autoimp::repl::{run_repl, ReplSession};
use autoimp::{
    activate, ActivationConfig, AliasTable, Discovery, FsImporter, Namespace, RebindPolicy,
    Scanner, SearchPath,
};

#[derive(Parser)]
#[command(
    name = "autoimp",
    version,
    about = "Lazy auto-import of every module on the search path"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Search path entry (directory or zip archive); repeatable.
    /// Defaults to AUTOIMP_PATH, then the current directory.
    #[arg(long = "path", value_name = "DIR", global = true)]
    paths: Vec<PathBuf>,

    /// JSON file with a list of [alias, module] pairs replacing the bundled table
    #[arg(long, value_name = "FILE", global = true)]
    aliases: Option<PathBuf>,

    /// Keep proxies bound after first use instead of rebinding the real module
    #[arg(long, global = true)]
    keep_proxies: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print importable top-level names found on the search path
    Scan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the alias table
    Aliases {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the interactive namespace (default)
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("autoimp: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = build_config(&cli)?;
    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Scan { json } => {
            let importer = FsImporter::new(config.search_path.clone());
            let discovery =
                Scanner::new(config.scan.clone()).discover(&config.search_path, &importer);
            print_discovery(&discovery, json);
        }
        Commands::Aliases { json } => {
            if json {
                println!("{}", config.aliases.to_json());
            } else {
                for (alias, canonical) in config.aliases.aliases() {
                    println!("{alias} -> {canonical}");
                }
            }
        }
        Commands::Repl => {
            let importer = Arc::new(FsImporter::new(config.search_path.clone()));
            let namespace = Namespace::new();
            let report = activate(&namespace, importer.clone(), &config);
            for issue in &report.discovery.issues {
                eprintln!("warning: {issue}");
            }
            run_repl(ReplSession::new(namespace, importer, config.aliases));
        }
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ActivationConfig, String> {
    let mut config = ActivationConfig::from_env();
    if !cli.paths.is_empty() {
        config = config.with_search_path(SearchPath::new(cli.paths.iter().cloned()));
    } else if config.search_path.is_empty() {
        config = config.with_search_path(SearchPath::new(["."]));
    }
    if let Some(path) = &cli.aliases {
        let src = fs::read_to_string(path)
            .map_err(|e| format!("cannot read alias file {}: {e}", path.display()))?;
        let table = AliasTable::from_json(&src).map_err(|e| format!("{}: {e}", path.display()))?;
        config = config.with_aliases(table);
    }
    if cli.keep_proxies {
        config = config.with_rebind(RebindPolicy::KeepProxy);
    }
    Ok(config)
}

fn print_discovery(discovery: &Discovery, as_json: bool) {
    if as_json {
        let issues: Vec<_> = discovery
            .issues
            .iter()
            .map(|issue| {
                json!({
                    "code": issue.code(),
                    "path": issue.path.display().to_string(),
                    "message": issue.to_string(),
                })
            })
            .collect();
        let names: Vec<String> = discovery.names.iter().map(|n| n.to_string()).collect();
        let doc = json!({ "names": names, "issues": issues });
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
        );
        return;
    }
    for name in &discovery.names {
        println!("{name}");
    }
    for issue in &discovery.issues {
        eprintln!("warning: {issue}");
    }
}
