#![no_main]

use libfuzzer_sys::fuzz_target;
use trio_transactions::SignedEvmTx;

fuzz_target!(|data: &[u8]| {
    if let Ok(tx) = SignedEvmTx::from_bytes(data) {
        let reencoded = SignedEvmTx::from_bytes(&tx.to_bytes());
        assert_eq!(reencoded.as_ref(), Ok(&tx));
        let _ = tx.signature();
    }
});
