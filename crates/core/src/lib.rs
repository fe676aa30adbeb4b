pub mod detection {
    pub mod domain {
        pub mod engine;
    }
    pub mod infrastructure;
}

pub mod metrics {
    pub mod domain {
        pub mod metric_catalog;
        pub mod metric_extractor;
        pub mod metric_tag;
        pub mod metric_value;
        pub mod metrics_sink;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod abort_synchronizer;
    pub mod analyze_video_use_case;
    pub mod detection_listener;
    pub mod detection_worker;
    pub mod metrics_presenter;
    pub mod pipeline_error;
    pub mod pipeline_logger;
    pub mod timestamp_guard;
}

pub mod rendering {
    pub mod domain {
        pub mod drawing_sink;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod detection_result;
    pub mod face;
    pub mod frame;
    pub mod frame_clock;
}

pub mod triggers {
    pub mod domain {
        pub mod event_notifier;
        pub mod event_trigger;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}
