//! Optional FFmpeg feature flags, driven by one declarative table.
//!
//! Each optional library is a `(pkg-config id, configure flag)` row; the
//! flag set is built by iterating the table once against a probe. Table
//! order is the only ordering anywhere, so identical probe results always
//! produce the identical flag sequence.

use crate::probe::PackageProbe;
use serde::Serialize;

/// Optional libraries in emission order: video codecs first, then audio,
/// then resampling/subtitles/images/protocols/filters.
pub const OPTIONAL_LIBRARIES: [(&str, &str); 17] = [
    ("x264", "--enable-libx264"),
    ("x265", "--enable-libx265"),
    ("vpx", "--enable-libvpx"),
    ("aom", "--enable-libaom"),
    ("SvtAv1Enc", "--enable-libsvtav1"),
    ("rav1e", "--enable-librav1e"),
    ("dav1d", "--enable-libdav1d"),
    ("theora", "--enable-libtheora"),
    ("vorbis", "--enable-libvorbis"),
    ("opus", "--enable-libopus"),
    ("mp3lame", "--enable-libmp3lame"),
    ("soxr", "--enable-libsoxr"),
    ("libass", "--enable-libass"),
    ("freetype2", "--enable-libfreetype"),
    ("libwebp", "--enable-libwebp"),
    ("srt", "--enable-libsrt"),
    ("zimg", "--enable-libzimg"),
];

/// The one encoder that additionally requires `--enable-nonfree`. Only
/// probed when the user asked for it.
pub const NONFREE_LIBRARY: (&str, &str) = ("fdk-aac", "--enable-libfdk-aac");

#[derive(Debug, Clone, Serialize)]
pub struct FeatureFlag {
    pub library: &'static str,
    pub flag: &'static str,
    pub enabled: bool,
    pub nonfree: bool,
}

/// Ordered probe outcome over the fixed library table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureFlagSet {
    entries: Vec<FeatureFlag>,
}

impl FeatureFlagSet {
    /// Configure flags for every library found present, in table order.
    pub fn enabled_flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter(|e| e.enabled).map(|e| e.flag)
    }

    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    /// True when the nonfree encoder made it into the set; the caller must
    /// then also pass `--enable-nonfree`.
    pub fn has_nonfree(&self) -> bool {
        self.entries.iter().any(|e| e.nonfree && e.enabled)
    }

    pub fn entries(&self) -> &[FeatureFlag] {
        &self.entries
    }
}

/// Probe every optional library and collect enable-flags for the present
/// ones. The nonfree encoder is included only when it was requested AND
/// its probe succeeds; in every other combination it is silently absent.
pub fn build_feature_flags(probe: &dyn PackageProbe, nonfree_requested: bool) -> FeatureFlagSet {
    let mut entries: Vec<FeatureFlag> = OPTIONAL_LIBRARIES
        .iter()
        .map(|(library, flag)| FeatureFlag {
            library,
            flag,
            enabled: probe.available(library),
            nonfree: false,
        })
        .collect();

    if nonfree_requested {
        let (library, flag) = NONFREE_LIBRARY;
        entries.push(FeatureFlag {
            library,
            flag,
            enabled: probe.available(library),
            nonfree: true,
        });
    }

    FeatureFlagSet { entries }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::probe::StaticProbe;
    use proptest::prelude::*;

    proptest! {
        /// For any subset of present libraries the output is a subset of
        /// the table, bounded by 17 + 1, and deterministic.
        #[test]
        fn prop_flag_set_bounded_and_deterministic(
            mask in proptest::collection::vec(any::<bool>(), OPTIONAL_LIBRARIES.len()),
            nonfree in any::<bool>(),
            fdk_present in any::<bool>()
        ) {
            let mut libs: Vec<&str> = OPTIONAL_LIBRARIES
                .iter()
                .zip(mask.iter())
                .filter(|(_, &m)| m)
                .map(|((id, _), _)| *id)
                .collect();
            if fdk_present {
                libs.push("fdk-aac");
            }
            let probe = StaticProbe::with_libraries(&libs);

            let first = build_feature_flags(&probe, nonfree);
            let second = build_feature_flags(&probe, nonfree);

            prop_assert!(first.enabled_count() <= OPTIONAL_LIBRARIES.len() + 1);
            prop_assert_eq!(
                first.enabled_flags().collect::<Vec<_>>(),
                second.enabled_flags().collect::<Vec<_>>()
            );
            prop_assert_eq!(first.has_nonfree(), nonfree && fdk_present);
        }
    }
}
