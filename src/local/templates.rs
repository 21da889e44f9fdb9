//! Fixed copy pools per persona class.
//!
//! Body stances are three sentences each: the lead sentence carries the base
//! message and the optional brief summary, the other two are class-specific.

use super::classify::PersonaClass;

/// One body framing: a lead label plus two class-specific closing sentences.
#[derive(Debug, Clone, Copy)]
pub struct Stance {
    pub lead: &'static str,
    pub middle: &'static str,
    pub close: &'static str,
}

impl Stance {
    const fn new(lead: &'static str, middle: &'static str, close: &'static str) -> Self {
        Self {
            lead,
            middle,
            close,
        }
    }

    pub fn render(&self, message: &str, summary: Option<&str>) -> String {
        match summary {
            Some(summary) => format!(
                "{} {} — {}. {} {}",
                self.lead, message, summary, self.middle, self.close
            ),
            None => format!("{} {}. {} {}", self.lead, message, self.middle, self.close),
        }
    }
}

/// Subject template; `{}` is replaced by the original subject.
#[derive(Debug, Clone, Copy)]
pub struct SubjectTemplate(pub &'static str);

impl SubjectTemplate {
    pub fn render(&self, subject: &str) -> String {
        self.0.replacen("{}", subject, 1)
    }
}

const VALUE_STANCES: [Stance; 3] = [
    Stance::new(
        "Benefit-first:",
        "Every step is built to help you save.",
        "Real value, no fine print.",
    ),
    Stance::new(
        "Quick take:",
        "It's the simple way to save without extra effort.",
        "More value for the same spend.",
    ),
    Stance::new(
        "Your move:",
        "Grab the deal while it's live.",
        "Lock in the value in minutes.",
    ),
];

const PREMIUM_STANCES: [Stance; 3] = [
    Stance::new(
        "Benefit-first:",
        "Designed for members who expect the best.",
        "Your benefits, elevated.",
    ),
    Stance::new(
        "Quick take:",
        "Priority treatment with zero friction.",
        "More rewards for how often you show up.",
    ),
    Stance::new(
        "Your move:",
        "Your status perks are ready when you are.",
        "Start in one tap.",
    ),
];

const FAMILY_STANCES: [Stance; 3] = [
    Stance::new(
        "Benefit-first:",
        "Less juggling for the whole household.",
        "More time for what matters.",
    ),
    Stance::new(
        "Quick take:",
        "Built for busy days.",
        "Set it up now and forget about it.",
    ),
    Stance::new(
        "Your move:",
        "It takes minutes, not evenings.",
        "Get started today.",
    ),
];

const CURIOUS_STANCES: [Stance; 3] = [
    Stance::new(
        "Benefit-first:",
        "Something new is waiting to be explored.",
        "Be among the first to try it.",
    ),
    Stance::new(
        "Quick take:",
        "Under the hood, it just works better.",
        "Dig in and discover what changed.",
    ),
    Stance::new(
        "Your move:",
        "Explore the new features first.",
        "Start in minutes.",
    ),
];

const VALUE_SUBJECTS: [SubjectTemplate; 3] = [
    SubjectTemplate("Save more: {}"),
    SubjectTemplate("{}: more value, less spend"),
    SubjectTemplate("Your best deal yet: {}"),
];

const PREMIUM_SUBJECTS: [SubjectTemplate; 3] = [
    SubjectTemplate("Reserved for you: {}"),
    SubjectTemplate("{}, with priority access"),
    SubjectTemplate("Your status perk: {}"),
];

const FAMILY_SUBJECTS: [SubjectTemplate; 3] = [
    SubjectTemplate("{}, made easy for busy days"),
    SubjectTemplate("A quick win for the household: {}"),
    SubjectTemplate("Fits your week: {}"),
];

const CURIOUS_SUBJECTS: [SubjectTemplate; 3] = [
    SubjectTemplate("Discover what's new: {}"),
    SubjectTemplate("{}: a first look"),
    SubjectTemplate("Early access: {}"),
];

pub fn stances(class: PersonaClass) -> &'static [Stance; 3] {
    match class {
        PersonaClass::Value => &VALUE_STANCES,
        PersonaClass::Premium => &PREMIUM_STANCES,
        PersonaClass::Family => &FAMILY_STANCES,
        PersonaClass::Curious => &CURIOUS_STANCES,
    }
}

pub fn subjects(class: PersonaClass) -> &'static [SubjectTemplate; 3] {
    match class {
        PersonaClass::Value => &VALUE_SUBJECTS,
        PersonaClass::Premium => &PREMIUM_SUBJECTS,
        PersonaClass::Family => &FAMILY_SUBJECTS,
        PersonaClass::Curious => &CURIOUS_SUBJECTS,
    }
}
