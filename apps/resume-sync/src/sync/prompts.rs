// Resume extraction prompt templates.
// All prompts for the sync job are defined here.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_INVENTION_INSTRUCTION};

/// Placeholder replaced with the serialized snapshot.
pub const CURRENT_STATE_PLACEHOLDER: &str = "{current_state}";

pub const SCHEMA_GUIDE: &str = "\
1. profile (name, title, subtitle, about_me, social_links dict)
2. experience (company, role, start_date YYYY-MM-DD, end_date YYYY-MM-DD or null, location, achievements list)
3. projects (title, description, tech_stack list, repo_link, live_link, featured bool)
4. skills (category, items list)
5. certifications (name, issuer, issue_date YYYY-MM-DD, credential_url)";

pub const EXTRACTION_PROMPT: &str = r#"You are a Data Extraction Assistant. I have provided a Resume PDF and the current state of a PostgreSQL Database.

YOUR GOAL: Extract data from the resume to populate/update the database tables.

--- CURRENT DATABASE STATE ---
{current_state}

INSTRUCTIONS:
1. Parse the Resume PDF (text and links).
2. Map the data to the 5 tables defined below.
3. Compare with 'CURRENT DATABASE STATE'.
   - If a record exists (matching Company/Role, Project Title, Skill Category or Certification Name), use the EXISTING ID.
   - If it is new, do not include an "id" field at all.
   - CRITICAL: Do NOT include 'resume_url' in the profile, and never copy it from the database state.
4. Use null for an ongoing end_date.

TARGET JSON STRUCTURE:
{
    "profile": { ... },
    "experience": [ { ... }, ... ],
    "projects": [ { ... }, ... ],
    "skills": [ { ... }, ... ],
    "certifications": [ { ... }, ... ]
}

Schema Guide:
{schema_guide}

RULES:
{rules}"#;

/// Renders the extraction prompt around a serialized snapshot.
pub fn build_extraction_prompt(current_state: &str) -> String {
    let rules = format!("{NO_INVENTION_INSTRUCTION}\n{JSON_ONLY_INSTRUCTION}");
    // Fill the static slots first so snapshot text is never re-scanned.
    EXTRACTION_PROMPT
        .replace("{schema_guide}", SCHEMA_GUIDE)
        .replace("{rules}", &rules)
        .replace(CURRENT_STATE_PLACEHOLDER, current_state)
}
