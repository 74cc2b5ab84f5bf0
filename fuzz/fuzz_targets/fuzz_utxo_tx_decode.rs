#![no_main]

use libfuzzer_sys::fuzz_target;
use trio_transactions::{Decode, Encode, SignedUtxoTx};
use trio_types::Utxo;

fuzz_target!(|data: &[u8]| {
    let _ = Utxo::from_bytes(data);

    // Anything that decodes must re-encode to the same bytes.
    if let Ok(tx) = SignedUtxoTx::from_bytes(data) {
        assert_eq!(tx.to_bytes(), data);
        let again = SignedUtxoTx::from_issue_payload(&tx.issue_payload());
        assert_eq!(again.as_ref(), Ok(&tx));
    }
});
