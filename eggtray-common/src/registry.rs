//! Schema & enum registry
//!
//! Closed value sets used by descriptors: skills, experience levels, school
//! kinds and spoken languages. Values outside a set do not fail parsing; they
//! are carried as [`Tagged::Unknown`] so the validator can report them
//! precisely.

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, SubschemaValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A closed enumeration with stable string spellings
pub trait RegistryEnum: Sized + Copy + Eq + Ord + 'static {
    /// Name of the value set, used in diagnostics
    const KIND: &'static str;

    /// Every member of the set, in declaration order
    fn all() -> &'static [Self];

    /// Stable spelling used in descriptors and the artifact
    fn as_str(&self) -> &'static str;

    /// Lookup by spelling (exact, lowercase)
    fn lookup(raw: &str) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.as_str() == raw)
    }

    /// Spellings of every member
    fn allowed_values() -> Vec<&'static str> {
        Self::all().iter().map(|v| v.as_str()).collect()
    }
}

macro_rules! registry_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $variant ),+
        }

        impl RegistryEnum for $name {
            const KIND: &'static str = $kind;

            fn all() -> &'static [Self] {
                &[ $( $name::$variant ),+ ]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> String {
                stringify!($name).to_string()
            }

            fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
                string_enum_schema(<$name as RegistryEnum>::allowed_values())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as RegistryEnum>::lookup(s).ok_or_else(|| UnknownValue {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

/// String schema restricted to the given spellings
fn string_enum_schema(values: impl IntoIterator<Item = &'static str>) -> Schema {
    SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        enum_values: Some(values.into_iter().map(serde_json::Value::from).collect()),
        ..Default::default()
    }
    .into()
}

/// A value that is not a member of a closed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} value {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownValue {}

registry_enum! {
    /// Previous experience kinds
    Experience, "experience" {
        Volunteer => "volunteer",
        Intern => "intern",
        Trainee => "trainee",
        Employee => "employee",
    }
}

registry_enum! {
    /// Kind of secondary school or university
    School, "school" {
        It => "it",
        Math => "math",
        NonIt => "non_it",
    }
}

registry_enum! {
    /// Declared skill tags
    Skill, "skill" {
        // General areas
        Backend => "backend",
        Frontend => "frontend",
        Fullstack => "fullstack",
        Mobile => "mobile",
        Testing => "testing",
        // Mobile
        Android => "android",
        Flutter => "flutter",
        Kotlin => "kotlin",
        Swift => "swift",
        // Backend
        ApacheSpark => "apachespark",
        CSharp => "csharp",
        Django => "django",
        FastApi => "fastapi",
        Java => "java",
        Kafka => "kafka",
        Kubernetes => "kubernetes",
        Laravel => "laravel",
        Php => "php",
        PostgreSql => "postgresql",
        Python => "python",
        RabbitMq => "rabbitmq",
        Redis => "redis",
        SpringBoot => "springboot",
        Sql => "sql",
        Wpf => "wpf",
        // Low-level
        Arduino => "arduino",
        C => "c",
        Cpp => "cpp",
        Rust => "rust",
        Zig => "zig",
        // GIS
        PostGis => "postgis",
        // Data
        Pandas => "pandas",
        Matplotlib => "matplotlib",
        OpenCv => "opencv",
        TensorFlow => "tensorflow",
        // Frontend
        Angular => "angular",
        Css => "css",
        Html => "html",
        JavaScript => "javascript",
        JQuery => "jquery",
        React => "react",
        Scss => "scss",
        TypeScript => "typescript",
        Vue => "vue",
        // Tools
        Docker => "docker",
        Git => "git",
    }
}

impl Skill {
    /// Repository language name reported by GitHub for language-like skills
    ///
    /// Frameworks and tools return `None`; they cannot be corroborated from
    /// repository languages.
    pub fn github_language(&self) -> Option<&'static str> {
        match self {
            Skill::Kotlin => Some("Kotlin"),
            Skill::Swift => Some("Swift"),
            Skill::CSharp => Some("C#"),
            Skill::Java => Some("Java"),
            Skill::Php => Some("PHP"),
            Skill::Python => Some("Python"),
            Skill::C => Some("C"),
            Skill::Cpp => Some("C++"),
            Skill::Rust => Some("Rust"),
            Skill::Zig => Some("Zig"),
            Skill::Css => Some("CSS"),
            Skill::Html => Some("HTML"),
            Skill::JavaScript => Some("JavaScript"),
            Skill::Scss => Some("SCSS"),
            Skill::TypeScript => Some("TypeScript"),
            Skill::Vue => Some("Vue"),
            Skill::Flutter => Some("Dart"),
            Skill::Arduino => Some("C++"),
            _ => None,
        }
    }
}

/// ISO 639-1 two-letter language codes
const ISO_639_1: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy",
    "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj",
    "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht",
    "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv",
    "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky",
    "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn",
    "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny",
    "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru",
    "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr", "ss",
    "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr", "ts",
    "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi", "yo",
    "za", "zh", "zu",
];

/// Spoken language, identified by its ISO 639-1 code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Language(&'static str);

impl Language {
    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl JsonSchema for Language {
    fn schema_name() -> String {
        "Language".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        string_enum_schema(ISO_639_1.iter().copied())
    }
}

impl FromStr for Language {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ISO_639_1
            .iter()
            .find(|code| **code == s)
            .map(|code| Language(*code))
            .ok_or_else(|| UnknownValue {
                kind: "language",
                value: s.to_string(),
            })
    }
}

/// A registry value that may fall outside its closed set
///
/// Deserializes from a plain string: members become `Known`, anything else
/// is kept verbatim as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tagged<T> {
    Known(T),
    Unknown(String),
}

impl<T> Tagged<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Tagged::Known(v) => Some(v),
            Tagged::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Tagged::Known(_))
    }
}

impl<T: FromStr> Tagged<T> {
    /// Classify a raw spelling
    pub fn from_raw(raw: &str) -> Self {
        match raw.parse::<T>() {
            Ok(v) => Tagged::Known(v),
            Err(_) => Tagged::Unknown(raw.to_string()),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Tagged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tagged::Known(v) => v.fmt(f),
            Tagged::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl<T: fmt::Display> Serialize for Tagged<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Known spellings of `T`, or any other string
impl<T: JsonSchema> JsonSchema for Tagged<T> {
    fn schema_name() -> String {
        format!("Tagged_{}", T::schema_name())
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            subschemas: Some(Box::new(SubschemaValidation {
                any_of: Some(vec![gen.subschema_for::<T>(), gen.subschema_for::<String>()]),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Tagged<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Tagged::from_raw(&raw))
    }
}

/// Pure membership checks over the registry
pub struct Registry;

impl Registry {
    /// Whether `raw` is a member of `T`'s closed set
    pub fn is_known<T: FromStr>(raw: &str) -> bool {
        raw.parse::<T>().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_roundtrip_spelling() {
        for skill in Skill::all() {
            assert_eq!(skill.as_str().parse::<Skill>().unwrap(), *skill);
        }
    }

    #[test]
    fn test_skill_spellings_are_unique() {
        let mut values = Skill::allowed_values();
        let total = values.len();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), total);
    }

    #[test]
    fn test_tagged_keeps_unknown_values() {
        assert_eq!(Tagged::<Skill>::from_raw("python"), Tagged::Known(Skill::Python));
        assert_eq!(
            Tagged::<Skill>::from_raw("cobol"),
            Tagged::Unknown("cobol".to_string())
        );
    }

    #[test]
    fn test_tagged_deserializes_from_yaml_list() {
        let parsed: Vec<Tagged<Experience>> =
            serde_yaml::from_str("[intern, astronaut]").unwrap();
        assert_eq!(parsed[0], Tagged::Known(Experience::Intern));
        assert_eq!(parsed[1], Tagged::Unknown("astronaut".to_string()));
    }

    #[test]
    fn test_language_codes() {
        assert!(Registry::is_known::<Language>("cs"));
        assert!(Registry::is_known::<Language>("en"));
        assert!(!Registry::is_known::<Language>("cz"));
        assert!(!Registry::is_known::<Language>("EN"));
    }

    #[test]
    fn test_school_spelling_with_underscore() {
        assert_eq!("non_it".parse::<School>().unwrap(), School::NonIt);
        assert_eq!(School::NonIt.to_string(), "non_it");
    }

    #[test]
    fn test_github_language_mapping() {
        assert_eq!(Skill::Python.github_language(), Some("Python"));
        assert_eq!(Skill::CSharp.github_language(), Some("C#"));
        assert_eq!(Skill::Docker.github_language(), None);
    }

    #[test]
    fn test_schema_lists_known_spellings() {
        let schema = serde_json::to_value(schemars::schema_for!(School)).unwrap();
        assert_eq!(schema["enum"], serde_json::json!(["it", "math", "non_it"]));

        let tagged = serde_json::to_value(schemars::schema_for!(Tagged<School>)).unwrap();
        assert_eq!(tagged["anyOf"].as_array().map(|a| a.len()), Some(2));
    }
}
