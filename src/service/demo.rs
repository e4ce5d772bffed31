//! Demo fixture: five clients, one of each personality, with one message each.

use chrono::{DateTime, Duration, Utc};

use crate::engine::{FunnelStage, Personality};
use crate::storage::{Client, Interaction, InteractionType};

/// Clients and interactions to load into an empty store.
#[derive(Debug, Clone)]
pub struct DemoFixture {
    pub clients: Vec<Client>,
    pub interactions: Vec<Interaction>,
}

struct DemoClient {
    username: &'static str,
    name: &'static str,
    personality: Personality,
    stage: FunnelStage,
    interests: &'static [&'static str],
    total_interactions: u32,
    link_clicks: u32,
    response_rate: f64,
    minutes_since_last: i64,
    days_since_created: i64,
    interaction: DemoInteraction,
}

struct DemoInteraction {
    interaction_type: InteractionType,
    content: &'static str,
    response: &'static str,
    link_sent: bool,
    link_clicked: bool,
}

const DEMO_CLIENTS: &[DemoClient] = &[
    DemoClient {
        username: "@sarah_marketing",
        name: "Sarah Johnson",
        personality: Personality::Curious,
        stage: FunnelStage::Interest,
        interests: &["digital marketing", "social media", "growth"],
        total_interactions: 5,
        link_clicks: 1,
        response_rate: 0.8,
        minutes_since_last: 120,
        days_since_created: 3,
        interaction: DemoInteraction {
            interaction_type: InteractionType::Comment,
            content: "This looks interesting! How does it work?",
            response: "Great question! I love your curiosity \u{1F60A} The system is designed to help you scale your Instagram presence authentically. I've got a detailed breakdown that'll answer everything - let me send it to your DM so we can chat more freely!",
            link_sent: false,
            link_clicked: false,
        },
    },
    DemoClient {
        username: "@mike_entrepreneur",
        name: "Mike Chen",
        personality: Personality::Hesitant,
        stage: FunnelStage::Consideration,
        interests: &["entrepreneurship", "passive income", "courses"],
        total_interactions: 8,
        link_clicks: 2,
        response_rate: 0.6,
        minutes_since_last: 300,
        days_since_created: 5,
        interaction: DemoInteraction {
            interaction_type: InteractionType::Dm,
            content: "I'm not sure if this is right for me...",
            response: "I totally get that feeling! It's smart to be thoughtful about what you invest in. Here's what I can tell you - over 847 people have already transformed their Instagram game with this exact system. What specific concerns do you have? I'm happy to address them directly.",
            link_sent: false,
            link_clicked: false,
        },
    },
    DemoClient {
        username: "@emily_creator",
        name: "Emily Rodriguez",
        personality: Personality::HighlyEngaged,
        stage: FunnelStage::Intent,
        interests: &["content creation", "monetization", "Instagram growth"],
        total_interactions: 12,
        link_clicks: 3,
        response_rate: 0.9,
        minutes_since_last: 30,
        days_since_created: 7,
        interaction: DemoInteraction {
            interaction_type: InteractionType::Dm,
            content: "Can you send me the link? I want to check it out!",
            response: "Yes! I love your energy \u{1F525} I'm sending you a special access link right now. Just a heads up - we only have 12 spots left at this price point, and they're going fast. Check your DM for the link!",
            link_sent: true,
            link_clicked: true,
        },
    },
    DemoClient {
        username: "@alex_skeptic",
        name: "Alex Thompson",
        personality: Personality::Skeptical,
        stage: FunnelStage::Awareness,
        interests: &["business", "online courses", "reviews"],
        total_interactions: 3,
        link_clicks: 0,
        response_rate: 0.4,
        minutes_since_last: 720,
        days_since_created: 2,
        interaction: DemoInteraction {
            interaction_type: InteractionType::Comment,
            content: "Is this another scam?",
            response: "I appreciate the healthy skepticism - there's a lot of noise out there. What makes this different is we have real, verifiable results. I can share case studies and testimonials from actual students if you'd like. What would help you feel confident about this?",
            link_sent: false,
            link_clicked: false,
        },
    },
    DemoClient {
        username: "@lisa_busy",
        name: "Lisa Park",
        personality: Personality::QuickTempered,
        stage: FunnelStage::Interest,
        interests: &["time management", "productivity", "side hustles"],
        total_interactions: 4,
        link_clicks: 1,
        response_rate: 0.5,
        minutes_since_last: 480,
        days_since_created: 4,
        interaction: DemoInteraction {
            interaction_type: InteractionType::Dm,
            content: "I don't have time for long courses",
            response: "I hear you - time is everything. That's exactly why this is structured for busy people. 15-minute daily modules you can do between meetings or during your commute. No fluff, just what works. Would a quick overview help you see if it fits your schedule?",
            link_sent: false,
            link_clicked: false,
        },
    },
];

/// Build the demo fixture with timestamps relative to `now`.
///
/// Each client's seeded message is counted on top of its listed history,
/// so `total_interactions` ends one above the table value.
pub fn demo_fixture(now: DateTime<Utc>) -> DemoFixture {
    let mut clients = Vec::with_capacity(DEMO_CLIENTS.len());
    let mut interactions = Vec::with_capacity(DEMO_CLIENTS.len());

    for demo in DEMO_CLIENTS {
        let last = now - Duration::minutes(demo.minutes_since_last);

        let mut client = Client::new(demo.username, demo.personality)
            .with_name(demo.name)
            .with_stage(demo.stage)
            .with_interests(demo.interests.iter().map(|s| s.to_string()).collect())
            .with_counters(demo.total_interactions, demo.link_clicks)
            .with_response_rate(demo.response_rate)
            .with_timestamps(now - Duration::days(demo.days_since_created), last);

        client.record_interaction(demo.personality, last);

        let seed = &demo.interaction;
        interactions.push(
            Interaction::new(&client.id, seed.interaction_type, seed.content)
                .with_response(seed.response)
                .with_timestamp(last)
                .with_link_sent(seed.link_sent)
                .with_link_clicked(seed.link_clicked),
        );
        clients.push(client);
    }

    DemoFixture {
        clients,
        interactions,
    }
}
