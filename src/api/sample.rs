//! Embedded sample message used by the `/test` smoke endpoint

/// A complete status message in the current tracker format
pub const SAMPLE_TOKEN_TEXT: &str = r#"🎲 $PVE | President vs Elon

3nuogKUQuxfxjCRud7Bpm5a9Q7eT7mxpFGNe9WeNbonk

⏳ Token age:  25m  | 👁 14
├ MC: $136.8K
├ Liq: $42.4K / SOL pooled: 111.02
└ ATH: $134.6K (-4% / 4s)

1 min:
├ Volume: $12,129.12
├ Buy volume ($): $6,446.81
├ Sell volume ($): $5,682.31
├ Buys: 165
└ Sells: 177

5 min:
├ Volume: $71,175.80
├ Buy volume ($): $46,124.03
├ Sell volume ($): $25,051.77
├ Buys: 585
└ Sells: 448

🎯 First 70 buyers:
🌚🌚🌚🟡🟡🟡🟡🟡🟡🟡
🟡🟢🟡⭕️⭕️⭕️⭕️⭕️⭕️⭕️
⭕️🟢🔵🔵🟢🟢⭕️🟡🟡⭕️
⭕️⭕️⭕️⭕️⭕️⭕️⭕️⭕️⭕️⭕️
⭕️⭕️⭕️⭕️⭕️⭕️⭕️⭕️🟢🟢
🔵⭕️⭕️⭕️🟢🔵⭕️⭕️⭕️⭕️
🔵⭕️⭕️⭕️🟢⭕️⭕️⭕️⭕️🟡

├ 🟢: 8 | 🔵: 5 | 🟡: 12 | ⭕️: 42
├ 🤡: 0 | 🌞: 0 | 🌗: 0 | 🌚: 3
├ Current/Initial: 16.76% / 98.87%

👥 Holders:
├ Total: 168
├ Freshies: 8.8% 1D | 87% 7D
├ Top 10: 23%
💰 Top 10 Holding (%)
15.82 | 2.48 | 2.42 | 2.42 | 2.41 | 2.38 | 2.31 | 2.29 | 2.26 | 2.22

😎 Dev
├ Dev current balance: 0%
└ Dev SOL balance: 0 SOL

🔒 Security:
├ NoMint: 🟢
├ Blacklist: 🟢
├ Burnt: 🟢
├ Dev Sold: 🟢
└ Dex Paid: 🔴"#;
