use clap::Parser;
use label_forms::{cli, config, error, extract, render};
use cli::{Cli, Commands};
use config::Config;
use error::{LabelFormsError, Result};
use label_forms_common::{format_duration, parse_duration, validate_cost, AutofillOutcome};
use label_forms_common::cost::parse_amount;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::ValidateCost { net, rate, vat, gross } => {
            let errors = validate_cost(
                parse_amount(&net),
                parse_amount(&rate),
                parse_amount(&vat),
                parse_amount(&gross),
            );

            if errors.is_empty() {
                println!("✔ 金額は整合しています");
            } else {
                for e in &errors {
                    println!("✘ {}", e);
                }
                return Err(LabelFormsError::InconsistentAmounts(errors.len()));
            }
        }

        Commands::Duration { value } => {
            if value.contains(':') || value.trim().is_empty() {
                println!("{}", parse_duration(&value)?);
            } else {
                let seconds: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| label_forms_common::Error::InvalidDuration(value.clone()))?;
                println!("{}", format_duration(Some(seconds)));
            }
        }

        Commands::RenderRow { kind, catalog, existing, add, output } => {
            let catalog = render::load_catalog(&catalog)?;
            let html = render::render_rows(kind, &catalog, existing.as_deref(), add)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, html)?;
                    println!("✔ HTMLを保存: {}", path.display());
                }
                None => println!("{}", html),
            }
        }

        Commands::Extract { file, base_url } => {
            println!("📄 label-forms - 請求書抽出\n");

            let mut config = config;
            if let Some(url) = base_url {
                config.base_url = url;
            }

            let mut form = extract::ConsoleForm::new(config.vat_rate_options.clone());
            match extract::run(&config, &file, &mut form).await? {
                AutofillOutcome::Applied(0) => println!("抽出できた項目はありません（手入力してください）"),
                AutofillOutcome::Applied(_) => {
                    println!("自動入力:");
                    for (id, value) in form.fields() {
                        println!("  {}: {}", id, value);
                    }
                }
                AutofillOutcome::Failed(e) => {
                    println!("✘ {}", e);
                    return Err(e.into());
                }
                AutofillOutcome::Skipped | AutofillOutcome::Discarded => {
                    println!("抽出は実行されませんでした");
                }
            }
        }

        Commands::Config { set_base_url, set_csrf_token, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(url) = set_base_url {
                config.base_url = url;
                changed = true;
            }
            if let Some(token) = set_csrf_token {
                config.csrf_token = Some(token);
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!("  URL: {}", config.base_url);
                println!("  抽出エンドポイント: {}", config.extraction_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  税率: {}", config.vat_rate_options.join(", "));
                println!(
                    "  CSRFトークン: {}",
                    if config.get_csrf_token().is_ok() { "設定済み" } else { "未設定" }
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
