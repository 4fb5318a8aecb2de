//! Translation run: `data.json` → `dataRu.json`.

use clap::Parser;
use feud_answers::api::{DeepLClient, RetryTranslate};
use feud_answers::cli::TranslateCli;
use feud_answers::config::TranslatorConfig;
use feud_answers::outputs::json::SnapshotWriter;
use feud_answers::translate::{TranslationSettings, TranslationStage, load_prior, load_source};
use feud_answers::utils::{ensure_writable_parent, init_tracing};
use std::error::Error;
use tracing::{debug, error, info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let start_time = std::time::Instant::now();
    info!("feud_translate starting up");

    let args = TranslateCli::parse();
    debug!(input = %args.input_file.display(), output = %args.output_file.display(), "Parsed CLI arguments");

    let config = TranslatorConfig::load(&args.config)?.with_auth_key_override(args.deepl_auth_key);
    let client = match DeepLClient::new(
        config.deepl_auth_key.as_deref(),
        config.deepl_api_url.as_deref(),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!(
                error = %e,
                "Set deepl_auth_key in {} or export DEEPL_AUTH_KEY",
                args.config.display()
            );
            return Err(e.into());
        }
    };
    info!(endpoint = client.base_url(), "DeepL client ready");

    let source = match load_source(&args.input_file).await {
        Ok(source) => source,
        Err(e) => {
            error!(path = %args.input_file.display(), error = %e, "Cannot read records to translate");
            return Err(e);
        }
    };
    let prior = load_prior(&args.output_file).await;

    ensure_writable_parent(&args.output_file).await?;
    let writer = SnapshotWriter::spawn(&args.output_file);

    let settings = TranslationSettings {
        source_lang: config.source_lang.clone(),
        target_lang: config.target_lang.clone(),
        ..Default::default()
    };
    let stage = TranslationStage::new(RetryTranslate::new(client), settings);
    let summary = stage.run(&source, prior, &writer).await;

    let elapsed = start_time.elapsed();
    info!(
        translated = summary.translated,
        skipped = summary.skipped(),
        failed = summary.failed,
        written = summary.written,
        path = %args.output_file.display(),
        secs = elapsed.as_secs(),
        "Translation complete"
    );

    Ok(())
}
