// Prompt templates for the interview provider. Placeholders in `{braces}` are
// filled with `str::replace` by `provider::llm`.

pub const JOB_ROLE: &str = "Full Stack Developer (React/Node.js)";

pub const INTERVIEWER_SYSTEM: &str = "You are a senior technical interviewer. \
    Be precise and concise. Follow the requested output format exactly.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

pub const CONTACT_EXTRACT_PROMPT: &str = r#"Analyze this resume text and extract the personal contact information.
Look for:
- Full name (usually at the top, could be the candidate's name)
- Email address (contains @ symbol)
- Phone number (various formats like +1-xxx-xxx-xxxx, (xxx) xxx-xxxx, xxx.xxx.xxxx)

Resume text:
{resume_text}

Return ONLY a JSON object with these exact keys: name, email, phone.
If any field is not clearly found, use an empty string "".

Example: {"name":"John Doe","email":"john.doe@email.com","phone":"+1-234-567-8900"}"#;

pub const QUESTION_PROMPT: &str = r#"You are conducting a technical interview for a {job_role} position.

Candidate's Resume Summary:
{resume_summary}

Previous Questions Asked:
{previous_questions}

Generate a {difficulty} level question (Question #{question_number}) that tests:
- For React: Components, Hooks, State Management, Performance Optimization
- For Node.js: Express, APIs, Middleware, Database Integration, Authentication

Requirements:
1. Make it specific to Full Stack Development with React and Node.js
2. {focus}
3. The question should be answerable in {answer_window}
4. Do NOT repeat topics from previous questions
5. Return ONLY the question, no preamble or explanations

Question:"#;

pub const EVALUATION_PROMPT: &str = r#"You are evaluating an interview answer for a {job_role} position.

Difficulty Level: {difficulty}
Question: {question}
Candidate's Answer: {answer}

Evaluate this answer and provide:
1. A score from 0-10 (where 10 is excellent and 0 is completely incorrect)
2. Brief feedback (1-2 sentences)

Scoring criteria:
- Technical accuracy (50%)
- Completeness (25%)
- Clarity of explanation (25%)

For {difficulty} difficulty:
- {expectation}

Return in this exact format:
Score: [number]
Feedback: [feedback text]"#;

pub const SUMMARY_PROMPT: &str = r#"Generate a professional interview summary for this {job_role} candidate.

Candidate: {name}
Email: {email}
Final Score: {final_percent}%

Interview Questions & Answers:
{transcript}

Provide a concise 3-4 sentence summary covering:
1. Overall performance and technical strengths
2. Areas that need improvement
3. Hiring recommendation (Strongly Recommend / Recommend / Consider / Do Not Recommend)

Keep it professional and constructive.

Summary:"#;
