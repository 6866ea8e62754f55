#![no_main]

use ecies_aead_hkdf::{
    new_decryptor, AesGcmDem, CurveType, EciesConfig, HashType, HybridDecrypt, KeyPair, PointFormat,
};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static DECRYPTORS: Lazy<Vec<HybridDecrypt<AesGcmDem>>> = Lazy::new(|| {
    let recipient = KeyPair::generate(CurveType::NistP256).unwrap();
    [PointFormat::Uncompressed, PointFormat::Compressed, PointFormat::LegacyUncompressed]
        .into_iter()
        .map(|format| {
            new_decryptor(
                EciesConfig::new()
                    .recipient_private_key(recipient.private_key().clone())
                    .hkdf_hash(HashType::Sha256)
                    .point_format(format)
                    .dem_helper(AesGcmDem::aes128()),
            )
            .unwrap()
        })
        .collect()
});

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let dec = &DECRYPTORS[(data[0] as usize) % DECRYPTORS.len()];
    let split = if data.len() > 1 { (data[1] as usize) % data.len() } else { 0 };
    let (ct, aad) = data[1..].split_at(split.min(data.len() - 1));

    let _ = dec.decrypt(ct, aad);
});
