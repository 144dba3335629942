use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{
    observe_error_message, StageDisplay, StageLabel, TaskCreated, TaskRequest, TaskStatus,
};
use poller::{
    EngineState, HttpProviderConfig, HttpStatusProvider, Poller, PollerConfig, StatusProvider,
};
use reqwest::Client;
use std::{env, io, time::Duration};
use tracing::info;

use crate::render::TerminalRenderer;

/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn status_url(base_url: &str) -> String {
    format!("{}/api/v1/status", base_url.trim_end_matches('/'))
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI para seguir el progreso de tareas map/reduce")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crea una tarea simulada en el master
    Submit {
        #[arg(long, default_value_t = 5)]
        map: u64,
        #[arg(long, default_value_t = 5)]
        reduce: u64,
        #[arg(long, default_value_t = 1)]
        summarize: u64,
        /// La tarea falla después de N ticks
        #[arg(long, value_name = "TICKS")]
        fail_after: Option<u32>,
    },
    /// Consulta el estado de una tarea una sola vez
    Status {
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
    /// Sigue el progreso de una tarea hasta que termine
    Watch {
        #[arg(value_name = "TASK_ID")]
        id: String,

        /// Pausa entre el fin de una consulta y la siguiente
        #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,

        /// Errores seguidos tolerados (0 = reintentar siempre)
        #[arg(long, default_value_t = 1)]
        max_consecutive_errors: u32,

        #[command(flatten)]
        stages: StageArgs,
    },
}

#[derive(clap::Args)]
struct StageArgs {
    /// Nombre de la barra de map
    #[arg(long, value_name = "LABEL")]
    map: Option<String>,
    /// Nombre de la barra de reduce
    #[arg(long, value_name = "LABEL")]
    reduce: Option<String>,
    /// Nombre de la barra de summarize
    #[arg(long, value_name = "LABEL")]
    summarize: Option<String>,

    #[arg(long)]
    hide_map: bool,
    #[arg(long)]
    hide_reduce: bool,
    #[arg(long)]
    hide_summarize: bool,
}

fn stage_label(label: Option<String>, hide: bool) -> StageLabel {
    match (hide, label) {
        (true, _) => StageLabel::Hidden,
        (false, Some(name)) => StageLabel::Custom(name),
        (false, None) => StageLabel::Default,
    }
}

impl StageArgs {
    fn into_display(self) -> StageDisplay {
        StageDisplay {
            map: stage_label(self.map, self.hide_map),
            reduce: stage_label(self.reduce, self.hide_reduce),
            summarize: stage_label(self.summarize, self.hide_summarize),
        }
    }
}

/// 0 = COMPLETE (o interrumpido), 1 = la tarea falló, 2 = no se pudo observar.
fn exit_code(last: &EngineState) -> i32 {
    match last {
        EngineState::Terminal(s) if s.status == TaskStatus::Failed => 1,
        EngineState::Failed(_) => 2,
        _ => 0,
    }
}

async fn watch(
    base_url: &str,
    id: String,
    interval: Duration,
    max_consecutive_errors: u32,
    display: StageDisplay,
) -> Result<i32> {
    let provider = HttpStatusProvider::new(HttpProviderConfig::new(status_url(base_url)))?;
    let config = PollerConfig::new(id)
        .with_interval(interval)
        .with_max_consecutive_errors(max_consecutive_errors);
    let poller = Poller::new(config, provider)?;

    let mut renderer = TerminalRenderer::new(io::stdout(), display);
    let mut states = poller.start()?;
    let mut last = EngineState::Idle;

    loop {
        tokio::select! {
            next = states.recv() => match next {
                Some(state) => {
                    renderer.render(&state)?;
                    last = state;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrumpido, deteniendo el poller");
                poller.stop();
                break;
            }
        }
    }

    Ok(exit_code(&last))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let base_url = master_base_url();

    match cli.command {
        Commands::Submit {
            map,
            reduce,
            summarize,
            fail_after,
        } => {
            let url = format!("{}/api/v1/tasks", base_url);
            let req = TaskRequest {
                map,
                reduce,
                summarize,
                fail_after,
            };

            let resp = Client::new()
                .post(&url)
                .json(&req)
                .send()
                .await?
                .error_for_status()?;
            let created: TaskCreated = resp.json().await?;

            println!("Tarea creada:");
            println!("  id: {}", created.task_id);
            println!("  deployment: {}", created.deployment_id);
            println!("  submitted_at: {}", created.submitted_at);
        }

        Commands::Status { id } => {
            let provider =
                HttpStatusProvider::new(HttpProviderConfig::new(status_url(&base_url)))?;
            match provider.fetch_status(&id).await {
                Ok(snapshot) => {
                    let mut renderer = TerminalRenderer::new(io::stdout(), StageDisplay::default());
                    renderer.draw_snapshot(&snapshot)?;
                    if let Some(stage) = snapshot.stage {
                        println!(
                            "  fase actual: {:?} ({:.1}%)",
                            stage, snapshot.stage_percent_complete
                        );
                    }
                }
                Err(e) => {
                    eprintln!("{}", observe_error_message(&e));
                    std::process::exit(2);
                }
            }
        }

        Commands::Watch {
            id,
            interval_ms,
            max_consecutive_errors,
            stages,
        } => {
            let code = watch(
                &base_url,
                id,
                Duration::from_millis(interval_ms),
                max_consecutive_errors,
                stages.into_display(),
            )
            .await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
