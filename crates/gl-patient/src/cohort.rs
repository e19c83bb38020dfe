//! The standard 30-patient virtual cohort.
//!
//! Ten adults, ten adolescents, ten children. Within a class, patient k
//! carries a deterministic spread factor that scales insulin sensitivity,
//! with therapy parameters adjusted the opposite way so every cohort member
//! is plausibly treated: a more sensitive patient runs less basal and more
//! grams per unit.

use crate::bergman::BergmanParams;
use crate::error::{PatientError, PatientResult};
use crate::meal::MealSchedule;
use crate::patient::VirtualPatient;
use crate::sensor::CgmSensor;
use gl_core::{PatientClass, PatientProfile};

/// Patients per class in the standard cohort.
pub const PATIENTS_PER_CLASS: usize = 10;

struct ClassPreset {
    class: PatientClass,
    basal_u_per_hr: f64,
    carb_ratio_g_per_u: f64,
    correction_mg_dl_per_u: f64,
    target_mg_dl: f64,
    p1: f64,
    p3: f64,
    gb: f64,
}

const PRESETS: [ClassPreset; 3] = [
    ClassPreset {
        class: PatientClass::Adult,
        basal_u_per_hr: 1.0,
        carb_ratio_g_per_u: 10.0,
        correction_mg_dl_per_u: 40.0,
        target_mg_dl: 110.0,
        p1: 0.028,
        p3: 5.0e-5,
        gb: 90.0,
    },
    ClassPreset {
        class: PatientClass::Adolescent,
        basal_u_per_hr: 0.9,
        carb_ratio_g_per_u: 12.0,
        correction_mg_dl_per_u: 50.0,
        target_mg_dl: 110.0,
        p1: 0.026,
        p3: 4.0e-5,
        gb: 95.0,
    },
    ClassPreset {
        class: PatientClass::Child,
        basal_u_per_hr: 0.6,
        carb_ratio_g_per_u: 18.0,
        correction_mg_dl_per_u: 70.0,
        target_mg_dl: 110.0,
        p1: 0.030,
        p3: 6.5e-5,
        gb: 85.0,
    },
];

fn preset_for(class: PatientClass) -> &'static ClassPreset {
    match class {
        PatientClass::Adult => &PRESETS[0],
        PatientClass::Adolescent => &PRESETS[1],
        PatientClass::Child => &PRESETS[2],
    }
}

/// Sensitivity spread for cohort member `index` (0-based within class).
fn spread(index: usize) -> f64 {
    0.85 + 0.03 * index as f64
}

fn profile_at(preset: &ClassPreset, index: usize) -> PatientProfile {
    let s = spread(index);
    PatientProfile {
        id: format!("{}#{:03}", preset.class.label(), index + 1),
        class: preset.class,
        basal_u_per_hr: preset.basal_u_per_hr / s,
        carb_ratio_g_per_u: preset.carb_ratio_g_per_u * s,
        correction_mg_dl_per_u: preset.correction_mg_dl_per_u * s,
        target_mg_dl: preset.target_mg_dl,
    }
}

/// All 30 cohort profiles, class by class, index order.
pub fn cohort_profiles() -> Vec<PatientProfile> {
    PRESETS
        .iter()
        .flat_map(|preset| (0..PATIENTS_PER_CLASS).map(move |i| profile_at(preset, i)))
        .collect()
}

/// The ten profiles of one class, index order.
pub fn class_profiles(class: PatientClass) -> Vec<PatientProfile> {
    let preset = preset_for(class);
    (0..PATIENTS_PER_CLASS)
        .map(|i| profile_at(preset, i))
        .collect()
}

fn cohort_index(profile: &PatientProfile) -> PatientResult<usize> {
    let unknown = || PatientError::UnknownPatient {
        id: profile.id.clone(),
    };
    let (prefix, number) = profile.id.split_once('#').ok_or_else(unknown)?;
    if prefix != profile.class.label() {
        return Err(unknown());
    }
    number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .filter(|&i| i < PATIENTS_PER_CLASS)
        .ok_or_else(unknown)
}

/// Model parameters for a cohort member, derived from its id and class.
pub fn params_for(profile: &PatientProfile) -> PatientResult<BergmanParams> {
    let preset = preset_for(profile.class);
    let index = cohort_index(profile)?;
    let s = spread(index);
    Ok(BergmanParams {
        p1: preset.p1,
        p3: preset.p3 * s,
        gb: preset.gb,
        ..BergmanParams::default()
    })
}

/// Build the virtual patient for one cohort profile.
pub fn build_patient(
    profile: &PatientProfile,
    seed: u64,
    schedule: &MealSchedule,
    sensor: CgmSensor,
    dt_min: f64,
) -> PatientResult<VirtualPatient> {
    let params = params_for(profile)?;
    VirtualPatient::new(params, schedule.clone(), sensor, dt_min, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cohort_has_thirty_unique_members() {
        let profiles = cohort_profiles();
        assert_eq!(profiles.len(), 30);
        let ids: HashSet<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 30);
        for class in [
            PatientClass::Adult,
            PatientClass::Adolescent,
            PatientClass::Child,
        ] {
            assert_eq!(profiles.iter().filter(|p| p.class == class).count(), 10);
        }
    }

    #[test]
    fn ids_follow_class_numbering() {
        let profiles = cohort_profiles();
        assert_eq!(profiles[0].id, "adult#001");
        assert_eq!(profiles[9].id, "adult#010");
        assert_eq!(profiles[10].id, "adolescent#001");
        assert_eq!(profiles[29].id, "child#010");
    }

    #[test]
    fn every_profile_validates() {
        for profile in cohort_profiles() {
            assert!(profile.validate().is_ok(), "profile {} invalid", profile.id);
            assert!(params_for(&profile).unwrap().validate().is_ok());
        }
    }

    #[test]
    fn sensitivity_spread_is_monotone() {
        let profiles = class_profiles(PatientClass::Adult);
        let first = params_for(&profiles[0]).unwrap();
        let last = params_for(&profiles[9]).unwrap();
        assert!(first.p3 < last.p3);
        // Therapy counters the sensitivity: less basal for the sensitive end.
        assert!(profiles[0].basal_u_per_hr > profiles[9].basal_u_per_hr);
        assert!(profiles[0].carb_ratio_g_per_u < profiles[9].carb_ratio_g_per_u);
    }

    #[test]
    fn classes_have_distinct_physiology() {
        let adult = params_for(&class_profiles(PatientClass::Adult)[0]).unwrap();
        let child = params_for(&class_profiles(PatientClass::Child)[0]).unwrap();
        assert!(child.p3 > adult.p3);
        assert!(child.gb < adult.gb);
    }

    #[test]
    fn unknown_ids_rejected() {
        let mut profile = class_profiles(PatientClass::Adult)[0].clone();
        profile.id = "alien#001".into();
        assert!(matches!(
            params_for(&profile),
            Err(PatientError::UnknownPatient { .. })
        ));

        profile.id = "adult#011".into();
        assert!(params_for(&profile).is_err());

        profile.id = "adult".into();
        assert!(params_for(&profile).is_err());
    }

    #[test]
    fn build_patient_covers_the_cohort() {
        let schedule = MealSchedule::default_daily();
        for profile in cohort_profiles() {
            let patient = build_patient(
                &profile,
                7,
                &schedule,
                CgmSensor::new(0.0).unwrap(),
                5.0,
            );
            assert!(patient.is_ok(), "failed to build {}", profile.id);
        }
    }
}
