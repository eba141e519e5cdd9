//! Seeded trader profiles for the demo leaderboard.

use rust_decimal_macros::dec;

use crate::models::{RiskLevel, TraderProfile, TradingStyle};

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// The demo platform's followable traders.
pub fn seed_profiles() -> Vec<TraderProfile> {
    vec![
        TraderProfile {
            id: 1,
            name: "Buffett_Bot".to_string(),
            avatar: "https://randomuser.me/api/portraits/men/32.jpg".to_string(),
            followers: 5218,
            return_30d: dec!(8.7),
            win_rate: dec!(78),
            risk_level: RiskLevel::Low,
            sharpe_ratio: dec!(2.5),
            style: TradingStyle::Value,
            trade_frequency: 0.3,
            avg_size: dec!(1000),
            preferred_symbols: symbols(&["AAPL", "MSFT", "DIS", "KO", "JNJ", "PG"]),
            description: "Long-term value investor focusing on blue chip stocks".to_string(),
        },
        TraderProfile {
            id: 2,
            name: "CathieWoodAI".to_string(),
            avatar: "https://randomuser.me/api/portraits/women/44.jpg".to_string(),
            followers: 4392,
            return_30d: dec!(16.5),
            win_rate: dec!(61),
            risk_level: RiskLevel::High,
            sharpe_ratio: dec!(1.7),
            style: TradingStyle::Growth,
            trade_frequency: 1.5,
            avg_size: dec!(2000),
            preferred_symbols: symbols(&["TSLA", "NVDA", "COIN", "PLTR", "SQ", "ROKU"]),
            description: "Aggressive growth investor betting on disruptive innovation".to_string(),
        },
        TraderProfile {
            id: 3,
            name: "RealPhilTown".to_string(),
            avatar: "https://randomuser.me/api/portraits/men/21.jpg".to_string(),
            followers: 3187,
            return_30d: dec!(11.2),
            win_rate: dec!(72),
            risk_level: RiskLevel::Medium,
            sharpe_ratio: dec!(2.1),
            style: TradingStyle::Momentum,
            trade_frequency: 2.0,
            avg_size: dec!(1500),
            preferred_symbols: symbols(&["AMZN", "AAPL", "MSFT", "GOOGL", "META", "AMD"]),
            description: "Momentum trader riding large-cap tech trends".to_string(),
        },
        TraderProfile {
            id: 4,
            name: "MemeStockLegend".to_string(),
            avatar: "https://randomuser.me/api/portraits/men/15.jpg".to_string(),
            followers: 8761,
            return_30d: dec!(24.8),
            win_rate: dec!(52),
            risk_level: RiskLevel::High,
            sharpe_ratio: dec!(1.1),
            style: TradingStyle::Meme,
            trade_frequency: 3.0,
            avg_size: dec!(800),
            preferred_symbols: symbols(&["GME", "AMC", "TSLA", "PLTR"]),
            description: "Erratic meme-stock trader chasing the next squeeze".to_string(),
        },
        TraderProfile {
            id: 5,
            name: "YourFriendMike".to_string(),
            avatar: "https://randomuser.me/api/portraits/men/41.jpg".to_string(),
            followers: 1053,
            return_30d: dec!(5.9),
            win_rate: dec!(64),
            risk_level: RiskLevel::Medium,
            sharpe_ratio: dec!(1.8),
            style: TradingStyle::Mixed,
            trade_frequency: 0.8,
            avg_size: dec!(500),
            preferred_symbols: symbols(&["AAPL", "TSLA", "DIS", "NFLX", "AMZN", "SBUX"]),
            description: "Everyday investor mixing household names".to_string(),
        },
        TraderProfile {
            id: 6,
            name: "RedditInvestor42".to_string(),
            avatar: "https://randomuser.me/api/portraits/men/67.jpg".to_string(),
            followers: 2471,
            return_30d: dec!(14.2),
            win_rate: dec!(59),
            risk_level: RiskLevel::High,
            sharpe_ratio: dec!(1.4),
            style: TradingStyle::Social,
            trade_frequency: 2.5,
            avg_size: dec!(700),
            preferred_symbols: symbols(&["TSLA", "NVDA", "AMD", "PLTR", "SOFI", "HOOD"]),
            description: "Sentiment follower trading whatever the forums are buzzing about"
                .to_string(),
        },
        TraderProfile {
            id: 7,
            name: "IndexETFQueen".to_string(),
            avatar: "https://randomuser.me/api/portraits/women/28.jpg".to_string(),
            followers: 1824,
            return_30d: dec!(4.2),
            win_rate: dec!(81),
            risk_level: RiskLevel::Low,
            sharpe_ratio: dec!(2.7),
            style: TradingStyle::Etf,
            trade_frequency: 0.5,
            avg_size: dec!(2000),
            preferred_symbols: symbols(&["SPY", "QQQ", "VTI", "ARKK", "XLK", "XLF"]),
            description: "Buy-and-hold index investor with rare rebalances".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_profiles_are_well_formed() {
        let profiles = seed_profiles();
        assert_eq!(profiles.len(), 7);

        for profile in &profiles {
            assert!(!profile.preferred_symbols.is_empty());
            assert!(profile.trade_frequency > 0.0);
            assert!(profile.avg_size > rust_decimal::Decimal::ZERO);
        }

        // IDs are unique
        let mut ids: Vec<_> = profiles.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), profiles.len());
    }
}
