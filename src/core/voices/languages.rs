//! Display names for the locales Google offers voices in.

use phf::phf_map;
use serde::Serialize;

/// Native-language display names, keyed by BCP-47 locale.
static LANGUAGE_NAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "ar-XA" => "Arabic, multi-region",
    "id-ID" => "Bahasa Indonesia (Indonesia)",
    "de-DE" => "Deutsch (Deutschland)",
    "en-AU" => "English (Australia)",
    "en-GB" => "English (Great Britain)",
    "en-IN" => "English (India)",
    "en-US" => "English (United States)",
    "es-ES" => "Español (España)",
    "es-US" => "Español (Estados Unidos)",
    "fr-CA" => "Français (Canada)",
    "fr-FR" => "Français (France)",
    "it-IT" => "Italiano (Italia)",
    "nl-NL" => "Nederlands (Nederland)",
    "pl-PL" => "Polski (Polska)",
    "pt-BR" => "Português (Brasil)",
    "sw-KE" => "Swahili (Kenya)",
    "vi-VN" => "Tiếng Việt (Việt Nam)",
    "tr-TR" => "Türkçe (Türkiye)",
    "ru-RU" => "Русский (Россия)",
    "uk-UA" => "Українська (Україна)",
    "ur-IN" => "اردو (بھارت)",
    "mr-IN" => "मराठी (भारत)",
    "hi-IN" => "हिन्दी (भारत)",
    "bn-IN" => "বাংলা (ভারত)",
    "gu-IN" => "ગુજરાતી (ભારત)",
    "ta-IN" => "தமிழ் (இந்தியா)",
    "te-IN" => "తెలుగు (భారతదేశం)",
    "kn-IN" => "ಕನ್ನಡ (ಭಾರತ)",
    "ml-IN" => "മലയാളം (ഇന്ത്യ)",
    "th-TH" => "ไทย (ประเทศไทย)",
    "ja-JP" => "日本語（日本)",
    "cmn-CN" => "普通话 (中国大陆)",
    "ko-KR" => "한국어 (대한민국)",
};

/// A selectable language with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    pub code: String,
    pub display_name: String,
}

/// Display name for `code`, or the code itself for locales without one.
pub fn language_display_name(code: &str) -> &str {
    LANGUAGE_NAMES.get(code).copied().unwrap_or(code)
}

/// Distinct codes from `codes`, sorted, each paired with its display name.
pub fn language_options<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<LanguageOption> {
    let mut unique: Vec<&str> = codes.into_iter().collect();
    unique.sort_unstable();
    unique.dedup();
    unique
        .into_iter()
        .map(|code| LanguageOption {
            code: code.to_string(),
            display_name: language_display_name(code).to_string(),
        })
        .collect()
}
