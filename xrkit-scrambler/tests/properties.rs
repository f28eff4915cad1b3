use proptest::prelude::*;
use xrkit_scrambler::{CipherConfig, Scrambler, SBOX_SIZE};

fn any_config() -> impl Strategy<Value = CipherConfig> {
    prop_oneof![Just(CipherConfig::Ru), Just(CipherConfig::Ww)]
}

proptest! {
    #[test]
    fn cipher_inverse_law(
        config in any_config(),
        buffer in proptest::collection::vec(any::<u8>(), 0..=4096),
    ) {
        let scrambler = Scrambler::shared(config);
        prop_assert_eq!(scrambler.decrypt(&scrambler.encrypt(&buffer)), buffer.clone());
        prop_assert_eq!(scrambler.encrypt(&scrambler.decrypt(&buffer)), buffer);
    }

    #[test]
    fn output_does_not_depend_on_call_history(
        config in any_config(),
        input in proptest::collection::vec(any::<u8>(), 0..=512),
        noise in proptest::collection::vec(any::<u8>(), 0..=512),
    ) {
        let first = Scrambler::new(config);
        let second = Scrambler::new(config);

        let expected = first.encrypt(&input);
        second.encrypt(&noise);
        second.decrypt(&noise);
        prop_assert_eq!(second.encrypt(&input), expected.clone());
        prop_assert_eq!(first.encrypt(&input), expected.clone());
        prop_assert_eq!(Scrambler::shared(config).encrypt(&input), expected);
    }
}

#[test]
fn sboxes_are_inverse_permutations() {
    for config in CipherConfig::ALL {
        let scrambler = Scrambler::new(config);
        let mut seen_enc = [false; SBOX_SIZE];
        let mut seen_dec = [false; SBOX_SIZE];
        for i in 0..SBOX_SIZE {
            let substituted = scrambler.enc_sbox()[i];
            assert!(!seen_enc[substituted as usize], "{config}: duplicate in enc_sbox");
            seen_enc[substituted as usize] = true;

            let restored = scrambler.dec_sbox()[i];
            assert!(!seen_dec[restored as usize], "{config}: duplicate in dec_sbox");
            seen_dec[restored as usize] = true;

            assert_eq!(scrambler.dec_sbox()[substituted as usize] as usize, i);
        }
    }
}

#[test]
fn every_byte_value_survives_a_round_trip() {
    let all_bytes: Vec<u8> = (0..=255).collect();
    let scrambler = Scrambler::shared(CipherConfig::Ww);
    let encrypted = scrambler.encrypt(&all_bytes);
    assert_ne!(encrypted, all_bytes);
    assert_eq!(scrambler.decrypt(&encrypted), all_bytes);
}

#[test]
fn configurations_differ() {
    let input = b"[general]\r\nsound = on\r\n";
    assert_ne!(
        Scrambler::shared(CipherConfig::Ru).encrypt(input),
        Scrambler::shared(CipherConfig::Ww).encrypt(input)
    );
}
