use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

pub const DEFAULT_GATEWAY_PORT: u16 = 25530;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    /// Defaults, then the rc file at `config_path`, then the environment.
    pub fn load_from(config_path: PathBuf) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            }
        }

        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn gateway_host(&self) -> String {
        self.get("FLEXCODE_GATEWAY_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    /// Falls back to the well-known gateway port when the value does not parse.
    pub fn gateway_port(&self) -> u16 {
        self.get("FLEXCODE_GATEWAY_PORT")
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_GATEWAY_PORT)
    }

    pub fn gateway_addr(&self) -> String {
        format!("{}:{}", self.gateway_host(), self.gateway_port())
    }

    pub fn entry_point(&self) -> String {
        self.get("FLEXCODE_ENTRY_POINT").unwrap_or_else(|| "t".into())
    }

    pub fn submit_method(&self) -> String {
        self.get("FLEXCODE_SUBMIT_METHOD").unwrap_or_else(|| "set_text".into())
    }

    pub fn result_method(&self) -> String {
        self.get("FLEXCODE_RESULT_METHOD").unwrap_or_else(|| "get_result".into())
    }

    /// Extension appended to saved files that have none, without the dot.
    pub fn default_extension(&self) -> String {
        self.get("FLEXCODE_DEFAULT_EXTENSION")
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .unwrap_or_else(|| "txt".into())
    }

    pub fn log_level(&self) -> String {
        self.get("FLEXCODE_LOG").unwrap_or_else(|| "warn".into())
    }

    pub fn log_path(&self) -> PathBuf {
        self.get_path("FLEXCODE_LOG_PATH")
            .unwrap_or_else(|| env::temp_dir().join("flexcode").join("flexcode.log"))
    }

    /// Sorted `KEY=VALUE` lines of the effective configuration.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .inner
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn exists_on_disk(&self) -> bool {
        Path::new(&self.config_path).exists()
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (k, v) = line.split_once('=')?;
    Some((k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    k.starts_with("FLEXCODE_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("flexcode").join(".flexcoderc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let temp = env::temp_dir().join("flexcode");

    m.insert("FLEXCODE_GATEWAY_HOST".into(), "127.0.0.1".into());
    m.insert("FLEXCODE_GATEWAY_PORT".into(), DEFAULT_GATEWAY_PORT.to_string());
    m.insert("FLEXCODE_ENTRY_POINT".into(), "t".into());
    m.insert("FLEXCODE_SUBMIT_METHOD".into(), "set_text".into());
    m.insert("FLEXCODE_RESULT_METHOD".into(), "get_result".into());
    m.insert("FLEXCODE_DEFAULT_EXTENSION".into(), "txt".into());
    m.insert("FLEXCODE_LOG".into(), "warn".into());
    m.insert(
        "FLEXCODE_LOG_PATH".into(),
        temp.join("flexcode.log").to_string_lossy().into_owned(),
    );

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_skips_comments_and_blanks() {
        assert_eq!(parse_line("# FLEXCODE_GATEWAY_PORT=1"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("no equals sign"), None);
        assert_eq!(
            parse_line(" FLEXCODE_GATEWAY_PORT = 4000 "),
            Some(("FLEXCODE_GATEWAY_PORT".to_string(), "4000".to_string()))
        );
    }

    #[test]
    fn test_rc_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join(".flexcoderc");
        fs::write(&rc, "# local gateway\nFLEXCODE_RESULT_METHOD=result_text\n").unwrap();

        let cfg = Config::load_from(rc);
        assert_eq!(cfg.result_method(), "result_text");
        assert_eq!(cfg.submit_method(), "set_text");
    }

    #[test]
    fn test_gateway_port_falls_back_on_garbage() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.flexcoderc"));
        cfg.set("FLEXCODE_GATEWAY_PORT", "not-a-port");
        assert_eq!(cfg.gateway_port(), DEFAULT_GATEWAY_PORT);
        cfg.set("FLEXCODE_GATEWAY_PORT", "4100");
        cfg.set("FLEXCODE_GATEWAY_HOST", "localhost");
        assert_eq!(cfg.gateway_addr(), "localhost:4100");
    }

    #[test]
    fn test_default_extension_strips_dot() {
        let mut cfg = Config::load_from(PathBuf::from("/nonexistent/.flexcoderc"));
        cfg.set("FLEXCODE_DEFAULT_EXTENSION", ".flx");
        assert_eq!(cfg.default_extension(), "flx");
    }
}
