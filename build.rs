//! # Build Script for Internationalization / 国际化构建脚本
//!
//! Checks the translation files in `locales/` against the base language
//! (`en.toml`) and emits a cargo warning for every key a locale is missing or
//! has in addition. Nested tables are flattened to dotted keys, the form the
//! lookups in the code use.
//!
//! 将 `locales/` 中的翻译文件与基础语言（`en.toml`）对比，
//! 为每个缺失或多余的键发出 cargo 警告。嵌套表会被展平为点分隔的键，即代码中查找时使用的形式。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Collects the dotted keys of every string in `value`.
/// 收集 `value` 中每个字符串的点分隔键。
fn flatten_keys(prefix: &str, value: &toml::Value, keys: &mut BTreeSet<String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, value) in table {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_keys(&key, value, keys);
            }
        }
        _ => {
            keys.insert(prefix.to_string());
        }
    }
}

fn read_keys(path: &Path) -> Result<BTreeSet<String>, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let value: toml::Value =
        toml::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut keys = BTreeSet::new();
    flatten_keys("", &value, &mut keys);
    Ok(keys)
}

fn main() {
    println!("cargo:rerun-if-changed=locales/");

    let locales_dir = Path::new("locales");
    let base_keys = match read_keys(&locales_dir.join("en.toml")) {
        Ok(keys) => keys,
        Err(e) => {
            println!("cargo:warning=Failed to read base locale {}", e);
            return;
        }
    };

    let Ok(entries) = fs::read_dir(locales_dir) else {
        return;
    };
    let mut lang_files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|s| s.to_str()) == Some("toml")
                && path.file_stem().and_then(|s| s.to_str()) != Some("en")
        })
        .collect();
    lang_files.sort();

    for path in &lang_files {
        let keys = match read_keys(path) {
            Ok(keys) => keys,
            Err(e) => {
                println!("cargo:warning=Failed to read locale {}", e);
                continue;
            }
        };
        for missing in base_keys.difference(&keys) {
            println!(
                "cargo:warning=Key '{}' is missing from {}",
                missing,
                path.display()
            );
        }
        for extra in keys.difference(&base_keys) {
            println!(
                "cargo:warning=Key '{}' in {} is not in en.toml",
                extra,
                path.display()
            );
        }
    }
}
