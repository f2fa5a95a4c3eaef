use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use uos::config::OsConfig;
use uos::session::{to_json, Session};

#[derive(Parser)]
#[command(name = "uos")]
#[command(about = "Run uos module calls against simulated board volumes")]
#[command(version)]
struct Cli {
    /// Volume layout to boot with (TOML)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Output results as JSON (results, stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match OsConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => OsConfig::default(),
    };

    // Determine script source: -c, file, or stdin
    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut session = match Session::from_config(&config).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: boot failed: {}", e);
            std::process::exit(1);
        }
    };

    let result = session.exec(&script).await;
    log::info!("unmounted {} volumes on exit", session.ctx.unmount_all().await);

    if cli.json {
        println!("{}", serde_json::json!({
            "results": result.results.iter().map(to_json).collect::<Vec<_>>(),
            "stdout": result.stdout,
            "stderr": result.stderr,
            "exitCode": result.exit_code,
        }));
    } else {
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
    }

    std::process::exit(result.exit_code);
}
