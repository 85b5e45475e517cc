use clap::{Parser, Subcommand};
use igbo_core::client::{Client, ClientError, LookupError};
use igbo_core::transport::{ReqwestTransport, Transport};
use igbo_core::types::{ClientConfig, LexicalEntry, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml::Value;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = ".igbo.toml";

#[derive(Debug, Parser)]
#[command(name = "igbo", version, about = "Look up words in the Igbo API dictionary")]
struct Cli {
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    InitConfig {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    Lookup {
        keyword: String,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long = "api-key")]
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiConfig {
    endpoint: String,
    api_key_env_var: String,
    timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env_var: "IGBO_API_KEY".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppConfig {
    api: ApiConfig,
}

impl AppConfig {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.api.endpoint.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonEnvelope {
    status: String,
    phase: String,
    message: String,
    details: JsonValue,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::InitConfig { force } => {
            init_config_file(Path::new(CONFIG_FILE), force)?;
            println!("initialized {CONFIG_FILE}");
        }
        Commands::Lookup {
            keyword,
            endpoint,
            api_key,
        } => {
            let mut cfg = load_config()?;
            if let Some(endpoint) = endpoint {
                cfg.api.endpoint = endpoint;
            }
            let api_key = resolve_api_key(&cfg, api_key, |k| std::env::var(k).ok());

            let transport =
                ReqwestTransport::with_timeout(Duration::from_millis(cfg.api.timeout_ms))?;
            let client = Client::from_config(&cfg.client_config(), api_key, transport)
                .map_err(|e| render_client_error(e, &cfg))?;
            let output = execute_lookup(&client, &keyword, cli.json).await?;
            println!("{output}");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn execute_lookup<T: Transport>(
    client: &Client<T>,
    keyword: &str,
    json_output: bool,
) -> anyhow::Result<String> {
    let entries = client
        .lookup(keyword)
        .await
        .map_err(render_lookup_error)?;

    if json_output {
        return Ok(serde_json::to_string_pretty(&JsonEnvelope {
            status: "ok".to_string(),
            phase: "lookup".to_string(),
            message: format!("{} entries for {keyword:?}", entries.len()),
            details: json!({ "keyword": keyword, "entries": entries }),
        })?);
    }

    if entries.is_empty() {
        return Ok(format!("no entries found for {keyword:?}"));
    }
    Ok(entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn render_entry(entry: &LexicalEntry) -> String {
    let mut lines = Vec::new();
    let mut head = entry.headword().to_string();
    if !entry.word_class.is_empty() {
        head.push_str(&format!(" ({})", entry.word_class));
    }
    if let Some(standard) = entry.is_standard_igbo.as_bool() {
        head.push_str(if standard { " [standard]" } else { " [dialectal]" });
    }
    lines.push(head);

    for (i, definition) in entry.definitions.iter().enumerate() {
        lines.push(format!("  {}. {definition}", i + 1));
    }
    if !entry.english.is_empty() {
        lines.push(format!("  english: {}", entry.english));
    }
    for (label, values) in [
        ("variations", &entry.variations),
        ("stems", &entry.stems),
        ("synonyms", &entry.synonyms),
        ("antonyms", &entry.antonyms),
    ] {
        if !values.is_empty() {
            lines.push(format!("  {label}: {}", values.join(", ")));
        }
    }
    if !entry.nsibidi.is_empty() {
        lines.push(format!("  nsibidi: {}", entry.nsibidi));
    }
    lines.join("\n")
}

fn resolve_api_key<F>(cfg: &AppConfig, flag: Option<String>, env_get: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    flag.filter(|v| !v.trim().is_empty())
        .or_else(|| env_get(&cfg.api.api_key_env_var))
        .unwrap_or_default()
}

fn load_config() -> anyhow::Result<AppConfig> {
    let local_path = PathBuf::from(CONFIG_FILE);
    let home_path = std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(CONFIG_FILE));

    let home = match &home_path {
        Some(path) => read_config_value(path)?,
        None => None,
    };
    let local = read_config_value(&local_path)?;

    resolve_config(home, local, |k| std::env::var(k).ok())
}

fn resolve_config<F>(
    home: Option<Value>,
    local: Option<Value>,
    env_get: F,
) -> anyhow::Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Value::try_from(AppConfig::default())?;
    if let Some(home_value) = home {
        merge_toml(&mut merged, home_value);
    }
    if let Some(local_value) = local {
        merge_toml(&mut merged, local_value);
    }

    let mut cfg: AppConfig = merged.try_into()?;
    apply_env_overrides(&mut cfg, env_get);
    Ok(cfg)
}

fn read_config_value(path: &Path) -> anyhow::Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let parsed = raw.parse::<Value>()?;
    tracing::debug!(path = %path.display(), "loaded config layer");
    Ok(Some(parsed))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_map), Value::Table(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_env_overrides<F>(cfg: &mut AppConfig, env_get: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env_get("IGBO_ENDPOINT").filter(|v| !v.trim().is_empty()) {
        cfg.api.endpoint = v;
    }
    if let Some(v) = env_get("IGBO_API_KEY_ENV_VAR").filter(|v| !v.trim().is_empty()) {
        cfg.api.api_key_env_var = v;
    }
    if let Some(v) = env_get("IGBO_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        cfg.api.timeout_ms = v;
    }
}

fn init_config_file(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; re-run with --force to overwrite",
            path.display()
        );
    }
    fs::write(path, config_template())?;
    Ok(())
}

fn config_template() -> &'static str {
    r#"# igbo configuration
# precedence: CLI > env > local .igbo.toml > home ~/.igbo.toml > defaults

[api]
endpoint = "https://www.igboapi.com/api/v1/words"
# the API key itself is read from this environment variable (or --api-key)
api_key_env_var = "IGBO_API_KEY"
timeout_ms = 15000
"#
}

fn render_client_error(err: ClientError, cfg: &AppConfig) -> anyhow::Error {
    match err {
        ClientError::CredentialMissing => anyhow::anyhow!(
            "{err}; set {} or pass --api-key",
            cfg.api.api_key_env_var
        ),
    }
}

fn render_lookup_error(err: LookupError) -> anyhow::Error {
    match err {
        LookupError::Decode(failure) => anyhow::anyhow!(
            "service returned {} bytes that are not a list of entries: {}",
            failure.bytes_read,
            failure.raw_text()
        ),
        other => anyhow::anyhow!(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igbo_core::transport::MockTransport;
    use igbo_core::types::TriState;
    use std::collections::HashMap;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn config_precedence_env_local_home_defaults() {
        let home = Some(
            r#"
            [api]
            endpoint = "https://home.invalid/api/v1/words"
            timeout_ms = 500
            "#
            .parse::<Value>()
            .expect("home parse"),
        );

        let local = Some(
            r#"
            [api]
            endpoint = "https://local.invalid/api/v1/words"
            "#
            .parse::<Value>()
            .expect("local parse"),
        );

        let env = HashMap::from([(
            "IGBO_API_KEY_ENV_VAR".to_string(),
            "MY_IGBO_KEY".to_string(),
        )]);

        let cfg = resolve_config(home, local, |k| env.get(k).cloned()).expect("resolve config");

        assert_eq!(cfg.api.endpoint, "https://local.invalid/api/v1/words");
        assert_eq!(cfg.api.timeout_ms, 500);
        assert_eq!(cfg.api.api_key_env_var, "MY_IGBO_KEY");

        let env = HashMap::from([(
            "IGBO_ENDPOINT".to_string(),
            "https://env.invalid/api/v1/words".to_string(),
        )]);
        let cfg = resolve_config(None, None, |k| env.get(k).cloned()).expect("resolve config");
        assert_eq!(cfg.api.endpoint, "https://env.invalid/api/v1/words");
        assert_eq!(cfg.api.timeout_ms, 15_000);
    }

    #[test]
    fn api_key_prefers_flag_then_env() {
        let cfg = AppConfig::default();
        let env = HashMap::from([("IGBO_API_KEY".to_string(), "from-env".to_string())]);

        let key = resolve_api_key(&cfg, Some("from-flag".to_string()), |k| env.get(k).cloned());
        assert_eq!(key, "from-flag");

        let key = resolve_api_key(&cfg, None, |k| env.get(k).cloned());
        assert_eq!(key, "from-env");

        let key = resolve_api_key(&cfg, None, |_| None);
        assert!(key.is_empty());
    }

    #[test]
    fn missing_api_key_names_the_env_var() {
        let cfg = AppConfig::default();
        let err = Client::from_config(&cfg.client_config(), "", MockTransport::new("[]"))
            .map_err(|e| render_client_error(e, &cfg))
            .expect_err("must fail");
        assert!(err.to_string().contains("IGBO_API_KEY"));
    }

    #[test]
    fn init_config_requires_force_to_overwrite() {
        let base = std::env::temp_dir().join(format!(
            "igbo-cli-test-{}-{}",
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("time")
                .as_nanos()
        ));
        fs::create_dir_all(&base).expect("create temp dir");
        let cfg_path = base.join(CONFIG_FILE);

        init_config_file(&cfg_path, false).expect("must create first config");
        let err = init_config_file(&cfg_path, false).expect_err("must reject overwrite");
        assert!(err.to_string().contains("--force"));

        init_config_file(&cfg_path, true).expect("force overwrite should succeed");
        let content = fs::read_to_string(&cfg_path).expect("read config");
        let parsed = resolve_config(None, Some(content.parse().expect("parse")), |_| None)
            .expect("template resolves");
        assert_eq!(parsed.api.endpoint, DEFAULT_ENDPOINT);

        fs::remove_dir_all(&base).expect("cleanup temp dir");
    }

    #[test]
    fn lookup_command_parses_flags() {
        let cli = Cli::try_parse_from([
            "igbo",
            "--json",
            "lookup",
            "ezi ndu",
            "--endpoint",
            "http://localhost:9000/words",
        ])
        .expect("cli parse");

        assert!(cli.json);
        match cli.cmd {
            Commands::Lookup {
                keyword,
                endpoint,
                api_key,
            } => {
                assert_eq!(keyword, "ezi ndu");
                assert_eq!(endpoint.as_deref(), Some("http://localhost:9000/words"));
                assert!(api_key.is_none());
            }
            _ => panic!("expected lookup command"),
        }
    }

    #[test]
    fn render_entry_lists_definitions() {
        let entry = LexicalEntry {
            word: "ezi ndu".to_string(),
            word_class: "NNC".to_string(),
            definitions: vec!["health".to_string()],
            stems: vec!["ezi".to_string(), "ndu".to_string()],
            is_standard_igbo: TriState::True,
            ..LexicalEntry::default()
        };
        let rendered = render_entry(&entry);
        assert!(rendered.starts_with("ezi ndu (NNC) [standard]"));
        assert!(rendered.contains("1. health"));
        assert!(rendered.contains("stems: ezi, ndu"));
    }

    #[tokio::test]
    async fn json_output_wraps_entries_in_envelope() {
        let payload = r#"[{"word":"ezi ndu","wordClass":"NNC","definitions":["health"]}]"#;
        let client = Client::new("key", MockTransport::new(payload)).expect("client");
        let output = execute_lookup(&client, "health", true).await.expect("lookup");

        let envelope: JsonEnvelope = serde_json::from_str(&output).expect("envelope");
        assert_eq!(envelope.status, "ok");
        assert_eq!(envelope.details["entries"][0]["word"], json!("ezi ndu"));
        assert!(envelope.details["entries"][0]["isStandardIgbo"].is_null());
    }

    #[tokio::test]
    async fn decode_failure_reports_byte_count() {
        let client = Client::new("key", MockTransport::new("[{\"word\"")).expect("client");
        let err = execute_lookup(&client, "health", false)
            .await
            .expect_err("must fail");
        assert!(err.to_string().contains("returned 8 bytes"));
    }

    #[tokio::test]
    async fn empty_result_is_reported_plainly() {
        let client = Client::new("key", MockTransport::new("[]")).expect("client");
        let output = execute_lookup(&client, "zzz", false).await.expect("lookup");
        assert_eq!(output, "no entries found for \"zzz\"");
    }
}
