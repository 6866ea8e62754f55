#![no_main]

use ecies_aead_hkdf::{decode_point, CurveType, PointFormat};
use libfuzzer_sys::fuzz_target;

const FORMATS: [PointFormat; 3] = [
    PointFormat::Uncompressed,
    PointFormat::Compressed,
    PointFormat::LegacyUncompressed,
];

fuzz_target!(|data: &[u8]| {
    for curve in CurveType::ALL {
        for format in FORMATS {
            if let Ok(point) = decode_point(data, curve, format) {
                // Anything accepted must re-encode to a valid point.
                let again = point.encode(PointFormat::Uncompressed).unwrap();
                assert_eq!(decode_point(&again, curve, PointFormat::Uncompressed).unwrap(), point);
            }
        }
    }
});
