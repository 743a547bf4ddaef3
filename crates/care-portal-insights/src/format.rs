//! Plain-text rendering of sensor readings for prompts.
//!
//! Zero and absent measurements are left out entirely. Blood pressure needs
//! both halves; a chemoresistive reading needs both its compound and value.

use std::fmt::Write;

use care_portal_core::models::{BreathReading, VitalReading};

/// A measurement worth printing.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

fn present_text(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Render readings into the text block embedded in the summary prompt.
///
/// Records are numbered from 1 in the order given.
pub fn format_health_data(vitals: &[VitalReading], breaths: &[BreathReading]) -> String {
    let mut out = String::from("PATIENT HEALTH DATA ANALYSIS\n\n");

    out.push_str("=== VITAL SIGNS DATA ===\n");
    if vitals.is_empty() {
        out.push_str("No vital signs data available.\n");
    }
    for (index, vital) in vitals.iter().enumerate() {
        write_vital(&mut out, index + 1, vital);
    }

    out.push_str("=== BREATH ANALYSIS DATA ===\n");
    if breaths.is_empty() {
        out.push_str("No breath analysis data available.\n");
    }
    for (index, breath) in breaths.iter().enumerate() {
        write_breath(&mut out, index + 1, breath);
    }

    out
}

// Writing into a String cannot fail.
fn write_vital(out: &mut String, number: usize, vital: &VitalReading) {
    let _ = writeln!(out, "Record {} ({}):", number, vital.recorded_at);
    if let Some(v) = present(vital.heart_rate_bpm) {
        let _ = writeln!(out, "- Heart Rate: {} bpm", v);
    }
    if let Some(v) = present(vital.pulse_bpm) {
        let _ = writeln!(out, "- Pulse: {} bpm", v);
    }
    if let Some(v) = present(vital.spo2_percent) {
        let _ = writeln!(out, "- SpO2: {}%", v);
    }
    if let Some(v) = present(vital.body_temp_c) {
        let _ = writeln!(out, "- Body Temperature: {}°C", v);
    }
    if let (Some(sys), Some(dia)) = (present(vital.systolic_bp), present(vital.diastolic_bp)) {
        let _ = writeln!(out, "- Blood Pressure: {}/{} mmHg", sys, dia);
    }
    if let Some(v) = present(vital.mean_bp) {
        let _ = writeln!(out, "- Mean BP: {} mmHg", v);
    }
    out.push('\n');
}

fn write_breath(out: &mut String, number: usize, breath: &BreathReading) {
    let _ = writeln!(out, "Record {} ({}):", number, breath.recorded_at);
    let gases = [
        ("Ammonia", breath.ammonia_ppm),
        ("CO2 (MQ)", breath.co2_ppm_mq),
        ("CO2 (MHZ19)", breath.co2_ppm_mhz19),
        ("Benzene", breath.benzene_ppm),
        ("Ethanol", breath.ethanol_ppm),
        ("VOCs (MICS)", breath.vocs_ppm_mics),
        ("Acetone (QCM)", breath.acetone_ppm_qcm),
    ];
    for (label, value) in gases {
        if let Some(v) = present(value) {
            let _ = writeln!(out, "- {}: {} ppm", label, v);
        }
    }
    if let (Some(kind), Some(v)) = (
        present_text(breath.voc_type_chemo.as_deref()),
        present(breath.voc_value_ppm_chemo),
    ) {
        let _ = writeln!(out, "- {}: {} ppm", kind, v);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_data() {
        let text = format_health_data(&[], &[]);
        assert_eq!(
            text,
            "PATIENT HEALTH DATA ANALYSIS\n\n\
             === VITAL SIGNS DATA ===\nNo vital signs data available.\n\
             === BREATH ANALYSIS DATA ===\nNo breath analysis data available.\n"
        );
    }

    #[test]
    fn test_vital_record() {
        let mut vital = VitalReading::new("25NP00001", "2025-01-01T08:00:00Z");
        vital.heart_rate_bpm = Some(72.0);
        vital.spo2_percent = Some(97.5);
        vital.systolic_bp = Some(120.0);
        vital.diastolic_bp = Some(80.0);

        let text = format_health_data(&[vital], &[]);
        assert!(text.contains("Record 1 (2025-01-01T08:00:00Z):\n"));
        assert!(text.contains("- Heart Rate: 72 bpm\n"));
        assert!(text.contains("- SpO2: 97.5%\n"));
        assert!(text.contains("- Blood Pressure: 120/80 mmHg\n"));
        assert!(!text.contains("Pulse"));
        assert!(!text.contains("Mean BP"));
    }

    #[test]
    fn test_zero_and_half_pairs_omitted() {
        let mut vital = VitalReading::new("25NP00001", "2025-01-01T08:00:00Z");
        vital.pulse_bpm = Some(0.0);
        vital.systolic_bp = Some(120.0);

        let mut breath = BreathReading::new("25NP00001", "2025-01-01T08:00:00Z");
        breath.voc_type_chemo = Some("Toluene".into());
        breath.acetone_ppm_qcm = Some(1.8);

        let text = format_health_data(&[vital], &[breath]);
        assert!(!text.contains("Pulse"));
        assert!(!text.contains("Blood Pressure"));
        assert!(!text.contains("Toluene"));
        assert!(text.contains("- Acetone (QCM): 1.8 ppm\n"));
    }

    #[test]
    fn test_breath_records_numbered_in_order() {
        let mut first = BreathReading::new("25NP00001", "2025-01-02T08:00:00Z");
        first.voc_type_chemo = Some("Toluene".into());
        first.voc_value_ppm_chemo = Some(0.4);
        let second = BreathReading::new("25NP00001", "2025-01-01T08:00:00Z");

        let text = format_health_data(&[], &[first, second]);
        let first_at = text.find("Record 1 (2025-01-02T08:00:00Z)").unwrap();
        let second_at = text.find("Record 2 (2025-01-01T08:00:00Z)").unwrap();
        assert!(first_at < second_at);
        assert!(text.contains("- Toluene: 0.4 ppm\n"));
    }

    proptest! {
        #[test]
        fn prop_one_header_per_record(n in 0usize..20) {
            let vitals: Vec<_> = (0..n)
                .map(|i| VitalReading::new("p", format!("t{}", i)))
                .collect();
            let text = format_health_data(&vitals, &[]);
            prop_assert_eq!(text.matches("Record ").count(), n);
        }
    }
}
