//! Deep page analysis use case.
//!
//! Fetches detailed ads for one page, persists them, picks the best
//! destination URL and chains a site-analysis task. The whole run is
//! tracked as a Scan under the caller-provided id.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    Ad, Country, DomainError, DomainResult, Scan, ScanId, ScanResult, ScanType, Url,
};
use crate::ports::{
    AdsLibraryPort, AdsRepository, PageRepository, RawAd, ScanRepository, TaskDispatcherPort,
    TaskRequest,
};

use super::search_ads_by_keyword::convert_raw_ad;

#[derive(Debug, Clone)]
pub struct AnalysePageDeepResult {
    pub page_id: String,
    pub ads_found: u32,
    pub ads_saved: u32,
    pub destination_url: Option<Url>,
    pub website_analysis_dispatched: bool,
}

pub struct AnalysePageDeepUseCase {
    ads_library: Arc<dyn AdsLibraryPort>,
    ads: Arc<dyn AdsRepository>,
    scans: Arc<dyn ScanRepository>,
    pages: Arc<dyn PageRepository>,
    dispatcher: Arc<dyn TaskDispatcherPort>,
}

impl AnalysePageDeepUseCase {
    pub fn new(
        ads_library: Arc<dyn AdsLibraryPort>,
        ads: Arc<dyn AdsRepository>,
        scans: Arc<dyn ScanRepository>,
        pages: Arc<dyn PageRepository>,
        dispatcher: Arc<dyn TaskDispatcherPort>,
    ) -> Self {
        Self {
            ads_library,
            ads,
            scans,
            pages,
            dispatcher,
        }
    }

    pub async fn execute(
        &self,
        page_id: &str,
        country: Country,
        scan_id: ScanId,
    ) -> DomainResult<AnalysePageDeepResult> {
        info!(page_id = %page_id, country = %country, scan_id = %scan_id, "Starting deep page analysis");

        let mut page = self
            .pages
            .get(page_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Page", page_id))?;

        let mut scan = Scan::with_id(scan_id, page_id.to_string(), ScanType::Full);
        scan.start();
        self.scans.save(&scan).await?;

        match self.process(&page, country).await {
            Ok(outcome) => {
                scan.complete(ScanResult {
                    ads_found: outcome.ads_found,
                    new_ads: outcome.ads_saved,
                    ..Default::default()
                });
                self.scans.save(&scan).await?;

                page.record_scan();
                self.pages.save(&page).await?;

                info!(
                    page_id = %page_id,
                    ads_found = outcome.ads_found,
                    destination_url = ?outcome.destination_url.as_ref().map(|u| u.as_str()),
                    dispatched = outcome.website_analysis_dispatched,
                    "Deep page analysis completed"
                );

                Ok(AnalysePageDeepResult {
                    page_id: page_id.to_string(),
                    ads_found: outcome.ads_found,
                    ads_saved: outcome.ads_saved,
                    destination_url: outcome.destination_url,
                    website_analysis_dispatched: outcome.website_analysis_dispatched,
                })
            }
            Err(err) => {
                scan.fail(err.to_string());
                if let Err(save_err) = self.scans.save(&scan).await {
                    warn!(error = %save_err, "Failed to record scan failure");
                }
                Err(err)
            }
        }
    }

    async fn process(
        &self,
        page: &crate::domain::Page,
        country: Country,
    ) -> DomainResult<ProcessOutcome> {
        let raw_ads = self
            .ads_library
            .get_ads_details(&page.advertiser_page_id, country, 1000)
            .await?;
        let ads_found = raw_ads.len() as u32;

        let mut ads: Vec<Ad> = Vec::with_capacity(raw_ads.len());
        // (url, priority): link_title-derived URLs outrank the rest
        let mut destination_urls: Vec<(Url, u8)> = Vec::new();

        for raw in &raw_ads {
            match convert_raw_ad(raw, &page.id) {
                Some(ad) => ads.push(ad),
                None => {
                    warn!(raw_ad_id = %raw.id, "Failed to convert detailed ad, skipping");
                    continue;
                }
            }
            if let Some((url, priority)) = extract_destination_url(raw) {
                destination_urls.push((url, priority));
            }
        }

        let ads_saved = ads.len() as u32;
        if !ads.is_empty() {
            self.ads.save_many(&ads).await?;
        }

        destination_urls.sort_by(|a, b| b.1.cmp(&a.1));
        let destination_url = destination_urls.into_iter().map(|(url, _)| url).next();

        let mut website_analysis_dispatched = false;
        if let Some(url) = &destination_url {
            self.dispatcher
                .dispatch(TaskRequest::AnalyseWebsite {
                    page_id: page.id.clone(),
                    url: url.clone(),
                })
                .await?;
            website_analysis_dispatched = true;
        }

        Ok(ProcessOutcome {
            ads_found,
            ads_saved,
            destination_url,
            website_analysis_dispatched,
        })
    }
}

struct ProcessOutcome {
    ads_found: u32,
    ads_saved: u32,
    destination_url: Option<Url>,
    website_analysis_dispatched: bool,
}

/// Pick a destination URL from one detailed ad.
///
/// Priority order `link_url > link_title > link_caption`; title-derived
/// candidates carry priority 2, the others 1.
fn extract_destination_url(raw: &RawAd) -> Option<(Url, u8)> {
    if let Some(link) = raw.link_url.as_deref() {
        if let Some(url) = parse_candidate(link) {
            return Some((url, 1));
        }
    }
    if let Some(title) = raw.ad_creative_link_titles.first() {
        if let Some(url) = parse_candidate(title) {
            return Some((url, 2));
        }
    }
    if let Some(caption) = raw.ad_creative_link_captions.first() {
        if let Some(url) = parse_candidate(caption) {
            return Some((url, 1));
        }
    }
    None
}

fn parse_candidate(text: &str) -> Option<Url> {
    super::search_ads_by_keyword::clean_url(text).and_then(|cleaned| Url::parse(&cleaned).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScanStatus;
    use crate::usecases::fakes::*;

    fn detailed(ad_id: &str, title: Option<&str>, caption: Option<&str>) -> RawAd {
        RawAd {
            id: ad_id.into(),
            page_id: "adv-1".into(),
            ad_creative_link_titles: title.map(|t| vec![t.to_string()]).unwrap_or_default(),
            ad_creative_link_captions: caption.map(|c| vec![c.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    struct Setup {
        library: Arc<FakeAdsLibrary>,
        ads: Arc<InMemoryAds>,
        scans: Arc<InMemoryScans>,
        pages: Arc<InMemoryPages>,
        dispatcher: Arc<RecordingDispatcher>,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                library: Arc::new(FakeAdsLibrary::default()),
                ads: Arc::new(InMemoryAds::default()),
                scans: Arc::new(InMemoryScans::default()),
                pages: Arc::new(InMemoryPages::with(sample_page("p-1", "adv-1"))),
                dispatcher: Arc::new(RecordingDispatcher::default()),
            }
        }

        fn use_case(&self) -> AnalysePageDeepUseCase {
            AnalysePageDeepUseCase::new(
                self.library.clone(),
                self.ads.clone(),
                self.scans.clone(),
                self.pages.clone(),
                self.dispatcher.clone(),
            )
        }
    }

    #[tokio::test]
    async fn missing_page_fails_before_any_scan() {
        let setup = Setup::new();
        let result = setup
            .use_case()
            .execute("nope", Country::parse("FR").unwrap(), ScanId::generate())
            .await;
        assert!(matches!(result, Err(DomainError::EntityNotFound { .. })));
        assert!(setup.scans.scans.lock().is_empty());
    }

    #[tokio::test]
    async fn title_urls_outrank_caption_urls() {
        let setup = Setup::new();
        *setup.library.detail_results.lock() = vec![
            detailed("m-1", None, Some("caption-store.com")),
            detailed("m-2", Some("title-store.com"), None),
        ];

        let result = setup
            .use_case()
            .execute("p-1", Country::parse("FR").unwrap(), ScanId::generate())
            .await
            .unwrap();

        assert_eq!(
            result.destination_url.unwrap().as_str(),
            "https://title-store.com"
        );
        assert!(result.website_analysis_dispatched);
        let dispatched = setup.dispatcher.dispatched.lock();
        assert!(matches!(
            &dispatched[0],
            TaskRequest::AnalyseWebsite { page_id, .. } if page_id == "p-1"
        ));
    }

    #[tokio::test]
    async fn no_urls_means_no_dispatch_but_scan_completes() {
        let setup = Setup::new();
        *setup.library.detail_results.lock() = vec![detailed("m-1", None, None)];
        let scan_id = ScanId::generate();

        let result = setup
            .use_case()
            .execute("p-1", Country::parse("FR").unwrap(), scan_id)
            .await
            .unwrap();

        assert!(result.destination_url.is_none());
        assert!(!result.website_analysis_dispatched);
        let scan = setup.scans.scans.lock().get(&scan_id.to_string()).cloned().unwrap();
        assert_eq!(scan.status, ScanStatus::Completed);
        assert_eq!(scan.result.unwrap().ads_found, 1);
    }

    #[tokio::test]
    async fn dispatch_failure_fails_the_scan() {
        let setup = Setup::new();
        *setup.library.detail_results.lock() =
            vec![detailed("m-1", Some("title-store.com"), None)];
        *setup.dispatcher.fail.lock() = true;
        let scan_id = ScanId::generate();

        let result = setup
            .use_case()
            .execute("p-1", Country::parse("FR").unwrap(), scan_id)
            .await;

        assert!(matches!(result, Err(DomainError::TaskDispatch { .. })));
        let scan = setup.scans.scans.lock().get(&scan_id.to_string()).cloned().unwrap();
        assert_eq!(scan.status, ScanStatus::Failed);
    }

    #[tokio::test]
    async fn upstream_failure_is_recorded_on_the_scan() {
        let setup = Setup::new();
        *setup.library.fail_with.lock() = Some("boom".into());
        let scan_id = ScanId::generate();

        let result = setup
            .use_case()
            .execute("p-1", Country::parse("FR").unwrap(), scan_id)
            .await;

        assert!(result.is_err());
        let scan = setup.scans.scans.lock().get(&scan_id.to_string()).cloned().unwrap();
        assert_eq!(scan.status, ScanStatus::Failed);
        assert!(scan.error_message.unwrap().contains("boom"));
    }
}
