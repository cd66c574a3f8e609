//! Display locales and message lookup
//!
//! Every `MessageKey` has text in every `Locale`; lookups never fall through
//! to a raw key.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ar,
    Fr,
}

impl Default for Locale {
    fn default() -> Self {
        Self::En
    }
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Ar, Locale::Fr];

    /// Parse a language code such as `ar` or `fr-CA`; unknown codes map to the
    /// default locale
    pub fn from_code(code: &str) -> Self {
        let primary = code
            .trim()
            .trim_matches('"')
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "ar" => Locale::Ar,
            "fr" => Locale::Fr,
            "en" => Locale::En,
            other => {
                tracing::debug!("Unknown language code {:?}, using default", other);
                Locale::default()
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
            Locale::Fr => "fr",
        }
    }

    /// BCP 47 tag handed to the speech synthesizer
    pub fn speech_tag(&self) -> &'static str {
        match self {
            Locale::En => "en-US",
            Locale::Ar => "ar-SA",
            Locale::Fr => "fr-FR",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Locale::Ar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKey {
    StartRecording,
    StopRecording,
    ExtractingLandmarks,
    Translating,
    NoInput,
    CameraDenied,
    RecordingFailed,
    TranslationFailed,
    Copied,
    /// Fallback for unknown names
    Generic,
}

impl MessageKey {
    /// Resolve a key by its camelCase name
    pub fn from_name(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_string()))
            .unwrap_or(MessageKey::Generic)
    }

    /// Message shown for an `ErrorResponse` code
    pub fn for_error_code(code: &str) -> Self {
        match code {
            "NO_INPUT" => MessageKey::NoInput,
            "PERMISSION_DENIED" | "CAPTURE_ERROR" => MessageKey::CameraDenied,
            "RECORDING_ERROR" => MessageKey::RecordingFailed,
            "EXTRACTION_ERROR" | "DETECTOR_ERROR" | "TRANSLATION_ERROR" => {
                MessageKey::TranslationFailed
            }
            _ => MessageKey::Generic,
        }
    }

    pub fn text(self, locale: Locale) -> &'static str {
        use Locale::*;
        use MessageKey::*;

        match (self, locale) {
            (StartRecording, En) => "Start recording",
            (StartRecording, Ar) => "بدء التسجيل",
            (StartRecording, Fr) => "Démarrer l'enregistrement",

            (StopRecording, En) => "Stop recording",
            (StopRecording, Ar) => "إيقاف التسجيل",
            (StopRecording, Fr) => "Arrêter l'enregistrement",

            (ExtractingLandmarks, En) => "Extracting landmarks",
            (ExtractingLandmarks, Ar) => "جارٍ استخراج المعالم",
            (ExtractingLandmarks, Fr) => "Extraction des points clés",

            (Translating, En) => "Translating",
            (Translating, Ar) => "جارٍ الترجمة",
            (Translating, Fr) => "Traduction en cours",

            (NoInput, En) => "Please record or upload a video first",
            (NoInput, Ar) => "يرجى تسجيل أو رفع فيديو أولاً",
            (NoInput, Fr) => "Veuillez d'abord enregistrer ou importer une vidéo",

            (CameraDenied, En) => "Camera access was denied",
            (CameraDenied, Ar) => "تم رفض الوصول إلى الكاميرا",
            (CameraDenied, Fr) => "L'accès à la caméra a été refusé",

            (RecordingFailed, En) => "Recording could not start",
            (RecordingFailed, Ar) => "تعذّر بدء التسجيل",
            (RecordingFailed, Fr) => "Impossible de démarrer l'enregistrement",

            (TranslationFailed, En) => "Translation failed",
            (TranslationFailed, Ar) => "فشلت الترجمة",
            (TranslationFailed, Fr) => "La traduction a échoué",

            (Copied, En) => "Copied",
            (Copied, Ar) => "تم النسخ",
            (Copied, Fr) => "Copié",

            (Generic, En) => "Something went wrong",
            (Generic, Ar) => "حدث خطأ ما",
            (Generic, Fr) => "Une erreur s'est produite",
        }
    }
}

/// Look up a message by name; unknown names yield the generic message
pub fn lookup(locale: Locale, name: &str) -> &'static str {
    MessageKey::from_name(name).text(locale)
}
