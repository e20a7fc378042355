// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "pt";

const BUNDLES: &[(&str, &str)] = &[
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Catálogo de mensagens por idioma, carregado dos JSON embutidos no binário.
#[derive(Debug, Clone)]
pub struct I18nStore {
    bundles: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, raw) in BUNDLES {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Catálogo de mensagens '{}' inválido", lang))?;
            bundles.insert(lang.to_string(), messages);
        }
        Ok(Self { bundles })
    }

    /// Busca a mensagem no idioma pedido, depois em português, e por fim devolve a própria chave.
    pub fn message(&self, lang: &str, key: &str) -> String {
        [lang, DEFAULT_LANG]
            .iter()
            .filter_map(|l| self.bundles.get(*l))
            .find_map(|bundle| bundle.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
