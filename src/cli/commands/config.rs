//! `archsmith config`: effective configuration with source attribution

use anyhow::Result;

use archsmith_utils::canonical::to_canonical_json;

use crate::Config;

pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();
    if json {
        let value: serde_json::Map<String, serde_json::Value> = effective
            .into_iter()
            .map(|(key, (value, source))| {
                (key, serde_json::json!({ "value": value, "source": source }))
            })
            .collect();
        println!("{}", to_canonical_json(&value)?);
        return Ok(());
    }
    print!("{}", render_table(&effective));
    Ok(())
}

fn render_table(effective: &std::collections::BTreeMap<String, (String, String)>) -> String {
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::from("Effective configuration:\n");
    for (key, (value, source)) in effective {
        out.push_str(&format!("  {key:<width$}  {value}  [{source}]\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_keys() {
        let config = Config::default();
        let table = render_table(&config.effective_config());
        assert!(table.starts_with("Effective configuration:\n"));
        let provider_line = table
            .lines()
            .find(|l| l.trim_start().starts_with("llm.provider "))
            .unwrap();
        assert!(provider_line.contains("gemini"));
        assert!(provider_line.ends_with("[default]"));
    }
}
