// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subject taxonomy — ordered topics with keyword lists. The built-in
// default is the twelve-topic vocabulary the archive has always been
// classified under; deployments can swap it via a JSON file.

use std::path::Path;

use cartoteca_core::config::MatchMode;
use cartoteca_core::error::Result;
use serde::{Deserialize, Serialize};

/// One subject with the keywords that signal it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub label: String,
    /// Stored lowercase; matching is case-insensitive.
    pub keywords: Vec<String>,
}

/// Ordered topic list plus the label used when nothing matches.
///
/// Topic order is significant: classification output follows it, which
/// keeps rebuilt artifacts byte-stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub topics: Vec<Topic>,
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

fn default_fallback_label() -> String {
    "General".to_string()
}

impl Taxonomy {
    /// Load a taxonomy from a JSON file, lowercasing every keyword.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut taxonomy: Self = serde_json::from_str(&raw)?;
        for topic in &mut taxonomy.topics {
            for keyword in &mut topic.keywords {
                *keyword = keyword.to_lowercase();
            }
        }
        Ok(taxonomy)
    }

    /// Classify `text` into subject labels.
    ///
    /// A topic is included when any one of its keywords occurs in the
    /// lowercased text; one hit per topic suffices. The result follows
    /// taxonomy order and is never empty.
    pub fn classify(&self, text: &str, mode: MatchMode) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut found = Vec::new();

        for topic in &self.topics {
            let hit = topic.keywords.iter().any(|keyword| match mode {
                MatchMode::Substring => lowered.contains(keyword.as_str()),
                MatchMode::WordBoundary => contains_word(&lowered, keyword),
            });
            if hit {
                found.push(topic.label.clone());
            }
        }

        if found.is_empty() {
            vec![self.fallback_label.clone()]
        } else {
            found
        }
    }
}

/// `needle` occurs in `haystack` delimited by non-alphanumeric characters
/// (or the string ends) on both sides.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    for (start, matched) in haystack.match_indices(needle) {
        let clear_before = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let clear_after = haystack[start + matched.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if clear_before && clear_after {
            return true;
        }
    }
    false
}

fn topic(label: &str, keywords: &[&str]) -> Topic {
    Topic {
        label: label.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

impl Default for Taxonomy {
    /// The archive's historic subject vocabulary.
    fn default() -> Self {
        Self {
            topics: vec![
                topic(
                    "Brasil",
                    &[
                        "brasil", "brasileiro", "brasileiros", "pátria", "nação", "nacional",
                        "país", "terra", "verde-amarelo", "bandeira", "hino",
                    ],
                ),
                topic(
                    "Política",
                    &[
                        "governo", "presidente", "eleição", "eleições", "partido", "político",
                        "políticos", "política", "congresso", "senado", "câmara", "deputado",
                        "senador", "ministro", "prefeito", "governador", "voto", "votos",
                        "democracia", "república", "estado", "poder",
                    ],
                ),
                topic(
                    "Economia",
                    &[
                        "economia", "econômico", "inflação", "dólar", "real", "dinheiro",
                        "emprego", "desemprego", "pib", "banco", "juros", "preço", "preços",
                        "salário", "imposto", "impostos", "crise", "mercado", "indústria",
                    ],
                ),
                topic(
                    "Educação",
                    &[
                        "educação", "escola", "escolas", "universidade", "ensino", "professor",
                        "professores", "aluno", "alunos", "estudante", "estudantes", "aula",
                        "livro", "livros", "aprender", "conhecimento", "formação",
                    ],
                ),
                topic(
                    "Ética",
                    &[
                        "ética", "moral", "valores", "honestidade", "corrupção", "corrupto",
                        "caráter", "dignidade", "integridade", "justiça", "verdade", "mentira",
                        "honra", "respeito", "decência",
                    ],
                ),
                topic(
                    "Família",
                    &[
                        "família", "pai", "mãe", "filho", "filhos", "filha", "esposa", "marido",
                        "casamento", "lar", "casa", "amor", "criança", "crianças", "pais",
                    ],
                ),
                topic(
                    "Religião",
                    &[
                        "deus", "jesus", "cristo", "igreja", "fé", "bíblia", "oração",
                        "religião", "cristão", "católico", "evangélico", "espírito", "santo",
                        "pecado", "salvação", "céu",
                    ],
                ),
                topic(
                    "Sociedade",
                    &[
                        "sociedade", "social", "comunidade", "povo", "população", "cidadão",
                        "cidadãos", "direito", "direitos", "dever", "deveres", "lei", "leis",
                        "ordem", "segurança", "violência", "crime",
                    ],
                ),
                topic(
                    "Cultura",
                    &[
                        "cultura", "cultural", "arte", "artista", "música", "teatro", "cinema",
                        "literatura", "tradição", "história", "histórico", "patrimônio",
                    ],
                ),
                topic(
                    "Meio Ambiente",
                    &[
                        "ambiente", "ambiental", "natureza", "ecologia", "floresta", "água",
                        "poluição", "sustentável", "preservação", "animais", "plantas",
                    ],
                ),
                topic(
                    "Saúde",
                    &[
                        "saúde", "hospital", "médico", "doença", "remédio", "tratamento",
                        "paciente", "sus", "medicina", "cura", "prevenção",
                    ],
                ),
                topic(
                    "Trabalho",
                    &[
                        "trabalho", "trabalhador", "emprego", "profissão", "carreira",
                        "empresa", "negócio", "patrão", "funcionário", "salário",
                    ],
                ),
            ],
            fallback_label: default_fallback_label(),
        }
    }
}
