//! Closed sets of values accepted by the API.
//!
//! Each set is an enum whose string form is what goes over the wire.
//! Parameter setters accept either the enum or a plain string and check
//! strings with [`ConstantSet::check`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RadarlyError, Result};

/// A fixed enumeration of allowed values.
pub trait ConstantSet {
    /// Name used in validation messages.
    const NAME: &'static str;
    /// Every allowed wire value.
    const VALUES: &'static [&'static str];

    fn contains(value: &str) -> bool {
        Self::VALUES.contains(&value)
    }

    /// Check a value, or recursively every value of a list.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first unknown value.
    fn check<C: Checkable + ?Sized>(value: &C) -> Result<()> {
        value.check_with(Self::NAME, &Self::contains)
    }
}

/// Values that can be checked against a set of allowed strings.
///
/// Implemented for strings, the constant enums, and (recursively) for
/// slices, arrays, vectors and references of those.
pub trait Checkable {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()>;
}

impl Checkable for str {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        if contains(self) {
            Ok(())
        } else {
            Err(unknown_option(self, name))
        }
    }
}

impl Checkable for String {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        self.as_str().check_with(name, contains)
    }
}

impl<T: Checkable + ?Sized> Checkable for &T {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        (**self).check_with(name, contains)
    }
}

impl<T: Checkable> Checkable for [T] {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        self.iter().try_for_each(|item| item.check_with(name, contains))
    }
}

impl<T: Checkable> Checkable for Vec<T> {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        self.as_slice().check_with(name, contains)
    }
}

impl<T: Checkable, const N: usize> Checkable for [T; N] {
    fn check_with(&self, name: &str, contains: &dyn Fn(&str) -> bool) -> Result<()> {
        self.as_slice().check_with(name, contains)
    }
}

pub(crate) fn unknown_option(value: &str, name: &str) -> RadarlyError {
    RadarlyError::validation(name, format!("'{value}' is an unknown option"))
}

macro_rules! constant_set {
    (
        $(#[$meta:meta])*
        $name:ident as $label:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl ConstantSet for $name {
            const NAME: &'static str = $label;
            const VALUES: &'static [&'static str] = &[$($value),+];
        }

        impl Checkable for $name {
            fn check_with(&self, _: &str, _: &dyn Fn(&str) -> bool) -> Result<()> {
                Ok(())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RadarlyError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(unknown_option(other, $label)),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

constant_set! {
    /// Origin platform of a publication.
    Platform as "PLATFORM" {
        Blog => "blog",
        Comment => "comment",
        Dailymotion => "dailymotion",
        Facebook => "facebook",
        Forum => "forum",
        Gplus => "gplus",
        Instagram => "instagram",
        Linkedin => "linkedin",
        Media => "media",
        Review => "review",
        Sinaweibo => "sinaweibo",
        Twitter => "twitter",
        Vkontakte => "vkontakte",
        Website => "website",
        Wechat => "wechat",
        Youku => "youku",
        Youtube => "youtube",
        Tiktok => "tiktok",
        Littleredbook => "littleredbook",
        Pinterest => "pinterest",
    }
}

constant_set! {
    /// Tone detected in a publication.
    Tone as "TONE" {
        Mixed => "mixed",
        Negative => "negative",
        Neutral => "neutral",
        Positive => "positive",
    }
}

constant_set! {
    /// Emotion detected in a publication.
    Emotion as "EMOTION" {
        Joy => "joy",
        Love => "love",
        Surprise => "surprise",
        Fear => "fear",
        Anger => "anger",
        Disgust => "disgust",
        Sadness => "sadness",
    }
}

constant_set! {
    MediaType as "MEDIA" {
        Image => "image",
        Video => "video",
    }
}

constant_set! {
    /// Kind of area used by geographical distributions.
    GeoType as "GEOTYPE" {
        Country => "country",
        Town => "town",
    }
}

constant_set! {
    Gender as "GENDER" {
        Female => "F",
        Male => "M",
    }
}

constant_set! {
    /// Term families available in a word cloud.
    CloudField as "CLOUD_FIELD" {
        Affects => "affects",
        Emojis => "emojis",
        Hashtags => "hashtags",
        Keywords => "keywords",
        Mentions => "mentions",
        NamedEntities => "namedEntities",
    }
}

constant_set! {
    /// Statistics blocks returned by the analytics endpoint.
    AnalyticsField as "ANALYTICS_FIELD" {
        Categories => "categories",
        Countries => "countries",
        Demography => "demography",
        DensityPerson => "persons",
        Focuses => "focuses",
        Genders => "genders",
        ImageGenders => "imageGenders",
        Languages => "languages",
        Logos => "logos",
        Occupations => "occupations",
        OperatingSystems => "operatingSystems",
        Platforms => "platforms",
        Tones => "tones",
        Emotions => "emotions",
    }
}

constant_set! {
    /// Aggregated metrics. Anything but `doc` is computed on the fly and
    /// slower to return.
    Metric as "METRIC" {
        Doc => "doc",
        Impression => "impression",
        Reach => "reach",
        Repost => "repost",
        Engagement => "engagement",
    }
}

constant_set! {
    Order as "ORDER" {
        Ascending => "asc",
        Descending => "desc",
    }
}

constant_set! {
    /// Every sort field known to the API. Each parameter type accepts only
    /// its own subset.
    SortBy as "BY" {
        Date => "date",
        Engagement => "radar.engagement",
        Impression => "radar.impression",
        InfluencerImpression => "impressions",
        InfluencerPost => "post",
        InfluencerReach => "reach",
        Random => "random",
        Rating => "radar.rating",
        Reach => "radar.reach",
        Virality => "radar.virality",
        Volumetry => "volumetry",
    }
}

constant_set! {
    /// Bucket size of temporal distributions.
    Interval as "INTERVAL" {
        Day => "day",
        Hour => "hour",
        Month => "month",
        Year => "year",
    }
}
