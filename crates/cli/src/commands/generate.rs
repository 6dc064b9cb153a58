use std::path::{Path, PathBuf};
use std::process;

use catena_codegen::{generate_cpp, CppConfig, Language};
use catena_core::loader::is_identifier;

use super::schema::{read_document, validate_document};
use super::{report_schema_errors, resolve_or_exit};
use crate::config::load_config;
use crate::{report_error, OutputFormat};

/// Flags given to `generate`. Anything left unset falls back to the config
/// file, then to built-in defaults.
pub(crate) struct GenerateArgs {
    pub device_model: PathBuf,
    pub out: Option<PathBuf>,
    pub language: Option<String>,
    pub namespace: Option<String>,
    pub schema: Option<PathBuf>,
    pub skip_schema: bool,
    pub config: Option<PathBuf>,
}

pub(crate) fn cmd_generate(args: GenerateArgs, output: OutputFormat, quiet: bool) {
    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c.generate,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let language_name = args
        .language
        .or(config.language)
        .unwrap_or_else(|| "cpp".to_string());
    let language: Language = match language_name.parse() {
        Ok(l) => l,
        Err(e) => {
            report_error(&format!("{}", e), output, quiet);
            process::exit(1);
        }
    };
    let out_dir = args
        .out
        .or(config.out)
        .unwrap_or_else(|| PathBuf::from("."));
    let schema = args.schema.or(config.schema);
    let namespace = args.namespace.or(config.namespace);

    if args.skip_schema || config.skip_schema {
        log::warn!("skipping schema validation of {}", args.device_model.display());
    } else {
        check_schema(&args.device_model, schema.as_deref(), output, quiet);
    }

    let mut model = resolve_or_exit(&args.device_model, output, quiet);
    if let Some(ns) = namespace {
        if !is_identifier(&ns) {
            let msg = format!("namespace '{}' is not a valid identifier", ns);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
        log::info!("overriding namespace '{}' with '{}'", model.namespace, ns);
        model.namespace = ns;
    }

    let source_name = args
        .device_model
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("device.{}.json", model.namespace));

    let generated = match language {
        Language::Cpp => generate_cpp(&model, &CppConfig::new(source_name)),
    };

    match generated.write_to(&out_dir) {
        Ok((header, body)) => {
            if !quiet {
                match output {
                    OutputFormat::Text => {
                        println!("{}", header.display());
                        println!("{}", body.display());
                    }
                    OutputFormat::Json => {
                        let json = serde_json::json!({
                            "header": header.display().to_string(),
                            "body": body.display().to_string(),
                        });
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&json).unwrap_or_default()
                        );
                    }
                }
            }
        }
        Err(e) => {
            report_error(&format!("{}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn check_schema(device_model: &Path, schema: Option<&Path>, output: OutputFormat, quiet: bool) {
    let errors = read_document(device_model).and_then(|doc| validate_document(&doc, schema));
    match errors {
        Ok(errors) if errors.is_empty() => {}
        Ok(errors) => {
            report_schema_errors(device_model, &errors, output, quiet);
            process::exit(1);
        }
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
