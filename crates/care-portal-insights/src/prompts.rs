//! Prompts for health summaries and risk assessments.

/// Model recorded in the prediction cache when none is configured.
pub const MODEL_NAME: &str = "gemini-2.0-flash";

/// Prompt asking for a structured summary of formatted health data.
pub fn make_summary_prompt(formatted_data: &str) -> String {
    format!(
        r#"As a medical AI assistant, analyze the following patient health data and provide a detailed, structured summary of health trends, patterns, and any notable anomalies. Focus on:

1. Vital signs trends (heart rate, blood pressure, oxygen saturation, temperature)
2. Breath analysis patterns and any concerning chemical levels
3. Temporal patterns and changes over time
4. Any values outside normal ranges
5. Correlations between different measurements

Please provide a comprehensive medical summary that will be used for further risk assessment.

{}"#,
        formatted_data
    )
}

/// Prompt asking for a risk assessment based on a previously generated summary.
pub fn make_risk_prompt(summary: &str) -> String {
    format!(
        r#"Based on the following health data summary, provide a medical risk assessment focusing on:

1. Potential lung diseases (COPD, asthma, lung cancer, pulmonary edema, etc.)
2. Cardiovascular risks (hypertension, arrhythmia, heart failure, etc.)
3. Metabolic disorders (diabetes complications, etc.)
4. Other health abnormalities indicated by the data
5. Severity levels and recommended actions

Provide specific medical reasoning for each identified risk. Format your response in a clear, professional medical assessment style.

HEALTH SUMMARY:
{}"#,
        summary
    )
}
