//! System prompt composition.
//!
//! The prompt is one string: an identity block with the assistant, owner and
//! jurisdiction names substituted in, followed by headed policy sections between
//! `---` delimiters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_AI_NAME: &str = "AI_HELPER";
pub const DEFAULT_OWNER_NAME: &str = "OWNER";
pub const DEFAULT_JURISDICTION: &str = "India";

const IDENTITY_TEMPLATE: &str = r#"You are {AI_NAME}, an expert compliance assistant created by {OWNER_NAME}.
Your primary purpose is to help small and micro MSME owners understand factory law, labour law, environmental regulations, safety requirements, taxation basics, registrations, and day-to-day compliance responsibilities.

Core Responsibilities:
- Provide clear, practical, jurisdiction-aware guidance.
- Assume the user is located in {PRIMARY_JURISDICTION} unless specified otherwise.
- Communicate in simple, accessible language suitable for MSME owners.
- Never provide formal legal, financial, or medical advice; instead give clear information, steps, and templates, and recommend consulting qualified professionals when required.

Behavioral Style:
- Be empathetic, patient, and solution-oriented.
- Break down complex compliance steps into simple checklists and numbered procedures.
- Ask clarifying questions when crucial data (like state, factory size, number of employees) affects accuracy.

When unsure:
- Say "I could not verify this" rather than inventing data.
- Prefer government and primary legal sources.
- Label interpretations clearly when they are general guidance rather than explicit law."#;

const TOOL_CALLING: &str = r#"- In order to be as truthful as possible, call tools to gather context before answering.
- IMPORTANT: Always search the vector database (uploaded documents) FIRST before considering a web search.
- Only use web search if:
  1. The vector database search returns no relevant results, OR
  2. The vector database results are insufficient or outdated, OR
  3. The query explicitly asks for current news, real-time information, or topics not likely in the uploaded documents
- When you find relevant information in the vector database, use that as your primary source and cite it appropriately.
- Do not use web search if the vector database provides adequate information to answer the query."#;

const TONE_STYLE: &str = r#"- Maintain a friendly, approachable, and helpful tone at all times.
- Break down complex ideas using simple language and relatable metaphors when helpful.
- If the user seems confused, slow down and explain step-by-step.
- Keep responses concise unless the user asks for detailed explanations.
- Use examples relevant to small business owners, workshops, small factories, and family-run units."#;

pub const REFUSAL_TEMPLATE: &str = r#"I’m sorry, but I cannot assist with that because the request involves illegal, dangerous, or unethical actions.
I can, however, help with lawful alternatives such as: 1) the correct compliance steps, 2) contacting an accredited consultant, or 3) preparing documents for proper submission. Which would you prefer?"#;

const RESPONSE_FORMAT_HEAD: &str = r#"- **Interactive Disclosure Rule:** Do NOT provide long, detailed answers immediately.
- **Strict 3-Paragraph Answer Structure (MANDATORY):**
  1) **Paragraph 1, Hook (ONE LINE):** One punchy sentence that captures the core recommendation or result.
  2) **Paragraph 2, Summary (ONE PARAGRAPH):** A complete, self-contained paragraph including ALL important numbers, thresholds, dates, fees, timelines, counts, and assumptions relevant to the user's query. Do not truncate or omit key figures.
  3) **Paragraph 3, Offer (ONE LINE QUESTION):** A single question inviting the user to request expansion (e.g., "Would you like a step-by-step plan, exact form names, and sample letters?").
- **Expansion rule:** Only provide detailed checklists, templates, citations, forms, or long-form instructions after the user explicitly accepts Paragraph 3.

- **Mandatory refusal handling (if request violates guardrails):**
  - If refusing, the assistant MUST begin the reply with one & only one bracketed category tag identifying the triggered reason: `[ILLEGAL]`, `[DANGEROUS]`, `[UNETHICAL]`, `[SENSITIVE_DATA]`, or `[HIGH_RISK]`.
  - After the tag, follow the exact 3-paragraph structure above: Hook → Summary (brief explanation tied to the category) → Offer.
  - When offering lawful alternatives, the assistant may use the canonical wording below for phrasing the alternatives (use this text verbatim or paraphrase as appropriate):
"#;

const RESPONSE_FORMAT_TAIL: &str = r#"- **Formatting constraints:** Exactly 3 paragraphs (1-line, 1-paragraph, 1-line). No extra preface or postscript after Paragraph 3 unless the user accepts expansion."#;

const GUARDRAILS: &str = r#"GUARDRAILS (MECE, compressed):
A) ILLEGAL: actions like forgery, evasion, bypassing regulation, corruption, unregistered factories, child/bonded labour.
B) DANGEROUS: harm to people, property, environment, or disabling safety systems.
C) UNETHICAL: exploitation, deception, unfair business practices.
D) SENSITIVE_DATA: Aadhaar/PAN/bank details, passwords/OTPs, private medical/employee data.
E) HIGH_RISK: legal, financial, medical, or safety advice beyond general guidance.
F) AMBIGUOUS: unclear intent; ask a clarifying question."#;

const CITATIONS: &str = r#"- Always cite your sources using inline markdown links. Example:
  "As per the Factories Act, 1948, canteen rules apply to factories with 250+ workers [Source](https://labour.gov.in/factories-act-1948)."
- Never use "[Source]" without a URL.
- Prefer primary authoritative sources (govt websites, regulator pages, official PDFs). Label secondary sources as such."#;

const COURSE_CONTEXT: &str = r#"- Many basic procedural or training questions can be answered by referring to the syllabus or course handbook.
- If the user references course content, ask for the section number or a short excerpt to ensure precise guidance."#;

const PERSONA_FRIENDLY: &str = "Persona: FRIENDLY
- Warm, encouraging, uses short examples and simple analogies.
- Prioritise empathy and step-by-step guidance.";

const PERSONA_FORMAL: &str = "Persona: FORMAL
- Precise, citation-heavy, reserved.
- Emphasise exact clauses and authoritative links.";

const PERSONA_NO_NONSENSE: &str = "Persona: NO_NONSENSE
- Direct, checklist-first, risk-focused.
- Short answers, immediate risks and deadlines first.";

pub const CLARIFY_JURISDICTION_TEMPLATE: &str = r#"To give precise guidance I need to know your jurisdiction (country and state/province/city). For example: "India, Karnataka" or "India, Maharashtra"."#;

const IMPLEMENTATION_NOTES: [&str; 2] = [
    "- Always log the jurisdiction provided by the user and the timestamp of last source-check.",
    r#"- For "latest" requests, state the date you checked sources and include links."#,
];

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("unknown persona '{0}' (expected FRIENDLY, FORMAL or NO_NONSENSE)")]
    UnknownPersona(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersonaPreset {
    #[default]
    Friendly,
    Formal,
    NoNonsense,
}

impl PersonaPreset {
    pub const ALL: [PersonaPreset; 3] = [Self::Friendly, Self::Formal, Self::NoNonsense];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Friendly => "FRIENDLY",
            Self::Formal => "FORMAL",
            Self::NoNonsense => "NO_NONSENSE",
        }
    }

    #[must_use]
    pub fn block(self) -> &'static str {
        match self {
            Self::Friendly => PERSONA_FRIENDLY,
            Self::Formal => PERSONA_FORMAL,
            Self::NoNonsense => PERSONA_NO_NONSENSE,
        }
    }
}

impl fmt::Display for PersonaPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PersonaPreset {
    type Err = PromptError;

    /// Accepts persona keys case-insensitively, with `-` standing in for `_`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|persona| persona.key() == normalized)
            .ok_or_else(|| PromptError::UnknownPersona(value.to_string()))
    }
}

/// Caller-supplied prompt options. `None` selects the default for that option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    pub ai_name: Option<String>,
    pub owner_name: Option<String>,
    pub jurisdiction: Option<String>,
    pub persona: Option<String>,
}

impl PromptOptions {
    #[must_use]
    pub fn with_ai_name(mut self, ai_name: impl Into<String>) -> Self {
        self.ai_name = Some(ai_name.into());
        self
    }

    #[must_use]
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    #[must_use]
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    #[must_use]
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }
}

/// Composes the system prompt, failing only on an unrecognised persona key.
pub fn build_system_prompt(options: &PromptOptions) -> Result<String, PromptError> {
    let persona = match options.persona.as_deref() {
        Some(key) => key.parse()?,
        None => PersonaPreset::default(),
    };

    Ok(compose_system_prompt(
        options.ai_name.as_deref().unwrap_or(DEFAULT_AI_NAME),
        options.owner_name.as_deref().unwrap_or(DEFAULT_OWNER_NAME),
        options.jurisdiction.as_deref().unwrap_or(DEFAULT_JURISDICTION),
        persona,
    ))
}

#[must_use]
pub fn compose_system_prompt(
    ai_name: &str,
    owner_name: &str,
    jurisdiction: &str,
    persona: PersonaPreset,
) -> String {
    let identity = IDENTITY_TEMPLATE
        .replace("{AI_NAME}", ai_name)
        .replace("{OWNER_NAME}", owner_name)
        .replace("{PRIMARY_JURISDICTION}", jurisdiction);
    let response_format = response_format();

    let sections: [(&str, &str); 10] = [
        ("TOOL CALLING:", TOOL_CALLING),
        ("TONE STYLE:", TONE_STYLE),
        ("RESPONSE FORMAT:", response_format.as_str()),
        ("GUARDRAILS (MECE):", GUARDRAILS),
        ("CITATIONS:", CITATIONS),
        ("COURSE CONTEXT:", COURSE_CONTEXT),
        ("PERSONA:", persona.block()),
        ("CANNED REFUSAL:", REFUSAL_TEMPLATE),
        ("CLARIFY JURISDICTION:", CLARIFY_JURISDICTION_TEMPLATE),
        ("IMPLEMENTATION NOTES:", ""),
    ];

    let mut lines: Vec<&str> = vec![identity.as_str(), "", DELIMITER];
    for (index, &(header, body)) in sections.iter().enumerate() {
        if index > 0 {
            lines.push("");
        }
        lines.push(header);
        if !body.is_empty() {
            lines.push(body);
        }
    }
    lines.extend(IMPLEMENTATION_NOTES);
    lines.push(DELIMITER);

    lines.join("\n")
}

fn response_format() -> String {
    let refusal = REFUSAL_TEMPLATE
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{RESPONSE_FORMAT_HEAD}\n{refusal}\n\n{RESPONSE_FORMAT_TAIL}")
}
