//! Fixed refusal records for disallowed intents.

use dnaexplain_common::schema::{Refusal, TranslationResult};

const COUNSELOR_ALTERNATIVE: &str =
    "I can explain what the terms in your report mean and suggest questions to bring to a genetic counselor or your doctor.";

fn refusal_text(intent: &str) -> &'static str {
    match intent {
        "medication advice" | "prescription request" => {
            "I can't advise on starting, stopping, or changing any medication. Medication decisions need a clinician who knows your full health history."
        }
        "treatment recommendation" | "treatment request" => {
            "I can't recommend treatments. Treatment choices depend on your personal and family history and should be made with your care team."
        }
        "diagnosis request" => {
            "I can't diagnose any condition. A genetic result on its own is not a diagnosis, and only a qualified clinician can make one."
        }
        "prognosis request" => {
            "I can't predict whether you will develop a condition. Most genetic findings change likelihoods, not certainties."
        }
        "supplement advice" => {
            "I can't recommend supplements or vitamins. Please discuss any supplement with your doctor or pharmacist."
        }
        _ => "I can't provide medical advice. This service is for education only.",
    }
}

pub fn refusal_for(intent: &str) -> Refusal {
    Refusal {
        user_intent: intent.to_string(),
        refusal_text: refusal_text(intent).to_string(),
        safe_alternative: COUNSELOR_ALTERNATIVE.to_string(),
    }
}

/// Append one refusal per detected intent, unless the result already
/// carries refusals of its own. Returns the number added.
pub fn apply_refusals(result: &mut TranslationResult, intents: &[&str]) -> usize {
    if intents.is_empty() || !result.refusals.is_empty() {
        return 0;
    }
    result.refusals.extend(intents.iter().map(|i| refusal_for(i)));
    intents.len()
}
