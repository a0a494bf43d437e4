//! Prompt text for the extraction and rewrite passes
//!
//! Every prompt is plain text templating: a persona line, the numbered rule
//! list, the clinician's text between delimiters, and (for extraction) the
//! indented template the model must fill. Prompts are in Portuguese, the
//! language of the records.

use anamnesis_domain::template::template_json_pretty;
use anamnesis_domain::PipelineMode;

const PERSONA: &str = "Você é um extrator de informações médicas.";

/// Rules shared by every extraction variant
const EXTRACTION_RULES: &[&str] = &[
    "Se uma informação não estiver no texto, mantenha o campo vazio.",
    "Não invente nenhuma informação e não descarte nenhuma informação presente no texto.",
    "Peso em quilogramas e altura em metros, apenas o número, sem unidade.",
    "Se o sexo não for informado, deduza-o a partir do nome do paciente.",
    "Em \"antecedentes pessoais\", preencha os campos não mencionados com a palavra \"nega\".",
    "\"PO\" significa pós-operatório: o procedimento que acompanha \"PO\" deve ir para \"cirurgias previas\".",
    "Normalize a capitalização: nomes próprios com iniciais maiúsculas, demais textos em caixa de frase.",
    "Responda SOMENTE com o JSON preenchido, sem comentários e sem texto adicional.",
];

/// Extra rules for narrative mixed with a completed questionnaire
const MIXED_RULES: &[&str] = &[
    "O texto combina uma narrativa livre com um questionário já respondido.",
    "Use as respostas do questionário para os campos estruturados e a narrativa para \"queixa principal\" e \"hda\".",
    "Quando narrativa e questionário divergirem, prefira a informação mais específica.",
];

const REWRITE_RULES: &[&str] = &[
    "Reescreva a história da doença atual (HDA) abaixo em linguagem clínica concisa.",
    "Use terminologia e abreviações médicas usuais; elimine repetições e frases de questionário.",
    "Mantenha todos os fatos clínicos, datas e medicações; não acrescente nada.",
    "Responda SOMENTE com um JSON no formato {\"hda\": \"...\"}.",
];

/// Builds the prompt for one provider call
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    mode: PipelineMode,
}

impl PromptBuilder {
    /// Create a builder for the given pipeline mode
    pub fn new(mode: PipelineMode) -> Self {
        Self { mode }
    }

    /// The extraction prompt for this mode.
    ///
    /// Questionnaire mode uses the standard extraction prompt; its difference
    /// is the second pass built by [`PromptBuilder::rewrite`].
    pub fn extraction(&self, text: &str) -> String {
        let mut prompt = String::with_capacity(text.len() + 2_048);

        prompt.push_str(PERSONA);
        prompt.push('\n');
        prompt.push_str("Receba o texto do paciente abaixo e preencha o JSON fornecido.\n\n");

        prompt.push_str("Regras:\n");
        let mut rules: Vec<&str> = EXTRACTION_RULES.to_vec();
        if self.mode == PipelineMode::Mixed {
            rules.splice(0..0, MIXED_RULES.iter().copied());
        }
        push_numbered(&mut prompt, &rules);

        prompt.push_str("\nTexto:\n---\n");
        prompt.push_str(text.trim());
        prompt.push_str("\n---\n\nJSON base:\n");
        prompt.push_str(&template_json_pretty());
        prompt.push('\n');

        prompt
    }

    /// The second-pass prompt condensing an already extracted HDA
    pub fn rewrite(&self, present_illness: &str) -> String {
        let mut prompt = String::with_capacity(present_illness.len() + 512);

        prompt.push_str(PERSONA);
        prompt.push_str("\n\nRegras:\n");
        push_numbered(&mut prompt, REWRITE_RULES);
        prompt.push_str("\nHDA:\n---\n");
        prompt.push_str(present_illness.trim());
        prompt.push_str("\n---\n");

        prompt
    }
}

fn push_numbered(prompt: &mut String, rules: &[&str]) {
    for (idx, rule) in rules.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", idx + 1, rule));
    }
}
