use serde::{Deserialize, Serialize};

use crate::error::SirenwatchError;

/// The fixed set of administrative areas the alert channel reports on:
/// 24 oblasts plus Crimea, Kyiv city and Sevastopol city. Each region has a
/// stable numeric id and a canonical Ukrainian display name, spelled exactly
/// as it appears in channel messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Region {
    Crimea = 1,
    Vinnytsia = 2,
    Volyn = 3,
    Dnipro = 4,
    Donetsk = 5,
    Zhytomyr = 6,
    Zakarpattia = 7,
    Zaporizhzhia = 8,
    IvanoFrankivsk = 9,
    Kyiv = 10,
    Kirovohrad = 11,
    Luhansk = 12,
    Lviv = 13,
    Mykolaiv = 14,
    Odesa = 15,
    Poltava = 16,
    Rivne = 17,
    Sumy = 18,
    Ternopil = 19,
    Kharkiv = 20,
    Kherson = 21,
    Khmelnytskyi = 22,
    Cherkasy = 23,
    Chernivtsi = 24,
    Chernihiv = 25,
    KyivCity = 26,
    SevastopolCity = 27,
}

impl Region {
    /// All regions, in stable-id order.
    pub const ALL: [Region; 27] = [
        Region::Crimea,
        Region::Vinnytsia,
        Region::Volyn,
        Region::Dnipro,
        Region::Donetsk,
        Region::Zhytomyr,
        Region::Zakarpattia,
        Region::Zaporizhzhia,
        Region::IvanoFrankivsk,
        Region::Kyiv,
        Region::Kirovohrad,
        Region::Luhansk,
        Region::Lviv,
        Region::Mykolaiv,
        Region::Odesa,
        Region::Poltava,
        Region::Rivne,
        Region::Sumy,
        Region::Ternopil,
        Region::Kharkiv,
        Region::Kherson,
        Region::Khmelnytskyi,
        Region::Cherkasy,
        Region::Chernivtsi,
        Region::Chernihiv,
        Region::KyivCity,
        Region::SevastopolCity,
    ];

    /// Stable numeric identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical Ukrainian display name.
    pub fn name(self) -> &'static str {
        match self {
            Region::Crimea => "Автономна Республіка Крим",
            Region::Vinnytsia => "Вінницька область",
            Region::Volyn => "Волинська область",
            Region::Dnipro => "Дніпропетровська область",
            Region::Donetsk => "Донецька область",
            Region::Zhytomyr => "Житомирська область",
            Region::Zakarpattia => "Закарпатська область",
            Region::Zaporizhzhia => "Запорізька область",
            Region::IvanoFrankivsk => "Івано-Франківська область",
            Region::Kyiv => "Київська область",
            Region::Kirovohrad => "Кіровоградська область",
            Region::Luhansk => "Луганська область",
            Region::Lviv => "Львівська область",
            Region::Mykolaiv => "Миколаївська область",
            Region::Odesa => "Одеська область",
            Region::Poltava => "Полтавська область",
            Region::Rivne => "Рівненська область",
            Region::Sumy => "Сумська область",
            Region::Ternopil => "Тернопільська область",
            Region::Kharkiv => "Харківська область",
            Region::Kherson => "Херсонська область",
            Region::Khmelnytskyi => "Хмельницька область",
            Region::Cherkasy => "Черкаська область",
            Region::Chernivtsi => "Чернівецька область",
            Region::Chernihiv => "Чернігівська область",
            Region::KyivCity => "м. Київ",
            Region::SevastopolCity => "м. Севастополь",
        }
    }

    /// Resolve a canonical display name to its region. Exact match only;
    /// the channel always spells region names the canonical way.
    pub fn from_name(name: &str) -> Result<Region, SirenwatchError> {
        Region::ALL
            .into_iter()
            .find(|region| region.name() == name)
            .ok_or_else(|| SirenwatchError::UnknownRegion(name.to_string()))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<u8> for Region {
    type Error = SirenwatchError;

    fn try_from(id: u8) -> Result<Region, SirenwatchError> {
        Region::ALL
            .into_iter()
            .find(|region| region.id() == id)
            .ok_or_else(|| SirenwatchError::UnknownRegion(id.to_string()))
    }
}
