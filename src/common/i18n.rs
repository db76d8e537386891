// src/common/i18n.rs

use std::collections::HashMap;

// Catálogos embutidos no binário
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("es", include_str!("../../locales/es.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

pub const DEFAULT_LANG: &str = "en";

#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load_embedded() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), messages);
        }
        tracing::debug!("🌐 {} catálogos de mensagens carregados", catalogs.len());
        Ok(Self { catalogs })
    }

    pub fn has_key(&self, lang: &str, key: &str) -> bool {
        self.catalogs
            .get(lang)
            .is_some_and(|messages| messages.contains_key(key))
    }

    /// Busca no idioma pedido, depois no padrão e por fim devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|m| m.get(key)));

        let Some(template) = template else {
            return key.to_string();
        };

        params.iter().fold(template.clone(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load_embedded().unwrap();
        let en = &store.catalogs["en"];
        for lang in ["es", "pt"] {
            let other = &store.catalogs[lang];
            for key in en.keys() {
                assert!(other.contains_key(key), "{} sem '{}'", lang, key);
            }
            assert_eq!(other.len(), en.len(), "{} tem chaves extras", lang);
        }
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load_embedded().unwrap();
        assert_eq!(
            store.translate("de", "errors.invalid_token", &[]),
            store.translate("en", "errors.invalid_token", &[])
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load_embedded().unwrap();
        assert_eq!(store.translate("es", "errors.nao_existe", &[]), "errors.nao_existe");
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::load_embedded().unwrap();
        let msg = store.translate("en", "errors.barcode_exists", &[("barcode", "750100".into())]);
        assert!(msg.contains("750100"));
        assert!(!msg.contains("{barcode}"));
    }
}
